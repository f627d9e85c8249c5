//! Assistant Backend Port - Interface for the hosted assistant service.
//!
//! This port abstracts the external conversational-AI provider (assistants,
//! threads, runs, run steps), letting the orchestrator drive a turn without
//! coupling to a concrete REST API.
//!
//! # Design
//!
//! - Every handle the provider issues comes back as a strongly-typed id
//! - Run step details are a tagged enum, so extraction pattern-matches on
//!   `StepDetails::MessageCreation` instead of probing optional fields
//! - Error taxonomy distinguishes retryable faults (network, rate limit,
//!   outage) from terminal ones (bad credentials, malformed request)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AssistantId, MessageId, RunId, ThreadId};

/// Port for the hosted assistant service.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Registers an assistant persona and returns its handle.
    ///
    /// Called once during startup provisioning.
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<AssistantId, BackendError>;

    /// Creates an empty conversation thread.
    async fn create_thread(&self) -> Result<ThreadId, BackendError>;

    /// Appends a message to a thread, verbatim.
    async fn append_message(
        &self,
        thread: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), BackendError>;

    /// Starts an asynchronous run of the assistant over the thread.
    async fn start_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
    ) -> Result<RunId, BackendError>;

    /// Fetches the current status of a run.
    async fn get_run_status(
        &self,
        thread: &ThreadId,
        run: &RunId,
    ) -> Result<RunStatus, BackendError>;

    /// Lists the recorded steps of a run, in their natural order.
    async fn list_run_steps(
        &self,
        thread: &ThreadId,
        run: &RunId,
    ) -> Result<Vec<RunStep>, BackendError>;

    /// Fetches a message stored on a thread.
    async fn get_message(
        &self,
        thread: &ThreadId,
        message: &MessageId,
    ) -> Result<AssistantMessage, BackendError>;
}

/// Persona registered with the backend at startup.
#[derive(Debug, Clone)]
pub struct AssistantSpec {
    /// Display name of the assistant.
    pub name: String,
    /// System instructions guiding its behavior.
    pub instructions: String,
    /// Model identifier (e.g., "gpt-4o").
    pub model: String,
    /// Knowledge collection the file-search tool is bound to.
    pub vector_store_id: String,
}

impl AssistantSpec {
    /// Creates a customer-support persona bound to a document collection.
    pub fn customer_support(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
        vector_store_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            vector_store_id: vector_store_id.into(),
        }
    }
}

/// Role of a message author on a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End-user input.
    User,
    /// Assistant output.
    Assistant,
}

/// Observable status of an asynchronous run.
///
/// The provider reports a wider vocabulary (`queued`, `in_progress`,
/// `requires_action`, ...); everything that is neither terminal success nor
/// terminal failure maps to `Pending` and the poll loop keeps waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    /// Run has not reached a terminal state yet.
    Pending,
    /// Run finished and produced output.
    Completed,
    /// Run terminated without producing output.
    Failed,
}

impl RunStatus {
    /// Returns true if the run reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Pending)
    }
}

/// One recorded sub-event of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStep {
    /// What this step did.
    pub details: StepDetails,
}

impl RunStep {
    /// Creates a message-creation step.
    pub fn message_creation(message_id: MessageId) -> Self {
        Self {
            details: StepDetails::MessageCreation { message_id },
        }
    }

    /// Creates a tool-invocation step (knowledge lookups and the like).
    pub fn tool_calls() -> Self {
        Self {
            details: StepDetails::ToolCalls,
        }
    }
}

/// Tagged step kinds, matched explicitly during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDetails {
    /// The assistant wrote a reply message to the thread.
    MessageCreation {
        /// Handle of the created message.
        message_id: MessageId,
    },
    /// The assistant invoked a tool (e.g., a knowledge lookup).
    ToolCalls,
}

/// A message fetched from a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantMessage {
    /// Text payloads in document order. Image or file payloads are skipped
    /// by adapters; only text reaches this type.
    pub text_parts: Vec<String>,
}

impl AssistantMessage {
    /// Creates a message from its text payloads.
    pub fn new(text_parts: Vec<String>) -> Self {
        Self { text_parts }
    }

    /// Returns the first text payload, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.text_parts.first().map(String::as_str)
    }
}

/// Assistant backend errors.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Provider is unavailable.
    #[error("backend unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse a provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider rejected the request as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::RateLimited { .. }
                | BackendError::Unavailable { .. }
                | BackendError::Network(_)
        )
    }
}
