//! OpenAI Assistants Backend - Implementation of AssistantBackend against
//! the Assistants v2 REST API.
//!
//! Covers the slice of the API one conversation turn needs: assistants,
//! threads, thread messages, runs and run steps. All requests carry the
//! `OpenAI-Beta: assistants=v2` header.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIAssistantsConfig::new(api_key)
//!     .with_base_url("https://api.openai.com/v1")
//!     .with_timeout(Duration::from_secs(30));
//!
//! let backend = OpenAIAssistantsBackend::new(config)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::foundation::{AssistantId, MessageId, RunId, ThreadId};
use crate::ports::{
    AssistantBackend, AssistantMessage, AssistantSpec, BackendError, MessageRole, RunStatus,
    RunStep, StepDetails,
};

/// Configuration for the OpenAI Assistants backend.
#[derive(Debug, Clone)]
pub struct OpenAIAssistantsConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAIAssistantsConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI Assistants API backend.
pub struct OpenAIAssistantsBackend {
    config: OpenAIAssistantsConfig,
    client: Client,
}

impl OpenAIAssistantsBackend {
    /// Creates a new backend with the given configuration.
    pub fn new(config: OpenAIAssistantsConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Sends a POST with the standard headers and maps transport errors.
    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Response, BackendError> {
        self.client
            .post(self.url(path))
            .bearer_auth(self.config.api_key())
            .header("OpenAI-Beta", "assistants=v2")
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)
    }

    /// Sends a GET with the standard headers and maps transport errors.
    async fn get(&self, path: &str) -> Result<Response, BackendError> {
        self.client
            .get(self.url(path))
            .bearer_auth(self.config.api_key())
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await
            .map_err(map_transport_error)
    }

    /// Maps non-success statuses to the backend error taxonomy.
    async fn check_status(&self, response: Response) -> Result<Response, BackendError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => Err(BackendError::AuthenticationFailed),
            429 => Err(BackendError::RateLimited {
                retry_after_secs: parse_retry_after(&error_body),
            }),
            400..=499 => Err(BackendError::InvalidRequest(error_body)),
            500..=599 => Err(BackendError::unavailable(format!(
                "server error {}: {}",
                status, error_body
            ))),
            _ => Err(BackendError::network(format!(
                "unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    async fn parse_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, BackendError> {
        let response = self.check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::parse(format!("failed to parse response: {}", e)))
    }
}

#[async_trait]
impl AssistantBackend for OpenAIAssistantsBackend {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<AssistantId, BackendError> {
        let body = CreateAssistantRequest {
            name: &spec.name,
            instructions: &spec.instructions,
            model: &spec.model,
            tools: vec![Tool {
                kind: "file_search",
            }],
            tool_resources: ToolResources {
                file_search: FileSearchResources {
                    vector_store_ids: vec![&spec.vector_store_id],
                },
            },
        };

        let response = self.post_json("/assistants", &body).await?;
        let created: ObjectHandle = self.parse_json(response).await?;
        Ok(AssistantId::new(created.id))
    }

    async fn create_thread(&self) -> Result<ThreadId, BackendError> {
        let response = self.post_json("/threads", &serde_json::json!({})).await?;
        let created: ObjectHandle = self.parse_json(response).await?;
        Ok(ThreadId::new(created.id))
    }

    async fn append_message(
        &self,
        thread: &ThreadId,
        role: MessageRole,
        text: &str,
    ) -> Result<(), BackendError> {
        let body = CreateMessageRequest {
            role,
            content: text,
        };

        let path = format!("/threads/{}/messages", thread);
        let response = self.post_json(&path, &body).await?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn start_run(
        &self,
        thread: &ThreadId,
        assistant: &AssistantId,
    ) -> Result<RunId, BackendError> {
        let body = CreateRunRequest {
            assistant_id: assistant.as_str(),
        };

        let path = format!("/threads/{}/runs", thread);
        let response = self.post_json(&path, &body).await?;
        let created: ObjectHandle = self.parse_json(response).await?;
        Ok(RunId::new(created.id))
    }

    async fn get_run_status(
        &self,
        thread: &ThreadId,
        run: &RunId,
    ) -> Result<RunStatus, BackendError> {
        let path = format!("/threads/{}/runs/{}", thread, run);
        let response = self.get(&path).await?;
        let retrieved: RunObject = self.parse_json(response).await?;
        Ok(map_run_status(&retrieved.status))
    }

    async fn list_run_steps(
        &self,
        thread: &ThreadId,
        run: &RunId,
    ) -> Result<Vec<RunStep>, BackendError> {
        // The API lists newest-first by default; ask for creation order so
        // "first message-creation step" means the run's earliest reply.
        let path = format!("/threads/{}/runs/{}/steps?order=asc", thread, run);
        let response = self.get(&path).await?;
        let listed: RunStepList = self.parse_json(response).await?;

        Ok(listed.data.into_iter().map(map_run_step).collect())
    }

    async fn get_message(
        &self,
        thread: &ThreadId,
        message: &MessageId,
    ) -> Result<AssistantMessage, BackendError> {
        let path = format!("/threads/{}/messages/{}", thread, message);
        let response = self.get(&path).await?;
        let retrieved: MessageObject = self.parse_json(response).await?;

        let text_parts = retrieved
            .content
            .into_iter()
            .filter_map(|part| match part {
                MessageContentPart::Text { text } => Some(text.value),
                MessageContentPart::Other => None,
            })
            .collect();

        Ok(AssistantMessage::new(text_parts))
    }
}

/// Maps reqwest transport failures to backend errors.
fn map_transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::network(format!("request timed out: {}", e))
    } else if e.is_connect() {
        BackendError::network(format!("connection failed: {}", e))
    } else {
        BackendError::network(e.to_string())
    }
}

/// Maps the provider's run status vocabulary onto the three-way port enum.
fn map_run_status(status: &str) -> RunStatus {
    match status {
        "completed" => RunStatus::Completed,
        "failed" => RunStatus::Failed,
        // queued, in_progress, requires_action, cancelling, ... keep polling
        _ => RunStatus::Pending,
    }
}

fn map_run_step(step: RunStepObject) -> RunStep {
    match step.step_details {
        RunStepDetails::MessageCreation { message_creation } => {
            RunStep::message_creation(MessageId::new(message_creation.message_id))
        }
        RunStepDetails::ToolCalls | RunStepDetails::Other => RunStep::tool_calls(),
    }
}

/// Parses retry-after seconds from a rate limit error body, defaulting to 30.
fn parse_retry_after(error_body: &str) -> u32 {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
        if let Some(msg) = parsed
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            if let Some(idx) = msg.find("try again in ") {
                let rest = &msg[idx + 13..];
                // The number may end the message, so a missing terminator
                // means the whole remainder is digits.
                let num_end = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len());
                if let Ok(secs) = rest[..num_end].parse::<u32>() {
                    return secs;
                }
            }
        }
    }
    30
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct CreateAssistantRequest<'a> {
    name: &'a str,
    instructions: &'a str,
    model: &'a str,
    tools: Vec<Tool>,
    tool_resources: ToolResources<'a>,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ToolResources<'a> {
    file_search: FileSearchResources<'a>,
}

#[derive(Debug, Serialize)]
struct FileSearchResources<'a> {
    vector_store_ids: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ObjectHandle {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    status: String,
}

#[derive(Debug, Deserialize)]
struct RunStepList {
    data: Vec<RunStepObject>,
}

#[derive(Debug, Deserialize)]
struct RunStepObject {
    step_details: RunStepDetails,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RunStepDetails {
    MessageCreation {
        message_creation: MessageCreationDetails,
    },
    ToolCalls,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageCreationDetails {
    message_id: String,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    content: Vec<MessageContentPart>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageContentPart {
    Text { text: TextPayload },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TextPayload {
    value: String,
}
