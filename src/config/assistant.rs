//! Assistant provisioning and polling configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Hosted assistant configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// Knowledge collection the file-search tool is bound to
    pub vector_store_id: Option<String>,

    /// Model the assistant runs on
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the Assistants API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Display name of the assistant
    #[serde(default = "default_name")]
    pub name: String,

    /// System instructions for the persona
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// Seconds between run status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Maximum number of status polls per turn
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,

    /// Timeout per backend HTTP request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl AssistantConfig {
    /// Get the per-request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Worst-case seconds a turn can spend waiting on a run
    pub fn poll_budget_secs(&self) -> u64 {
        self.poll_interval_secs * u64::from(self.poll_attempts)
    }

    /// Validate assistant configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty()) {
            return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
        }
        if !self.vector_store_id.as_ref().is_some_and(|v| !v.is_empty()) {
            return Err(ValidationError::MissingRequired("VECTOR_STORE_ID"));
        }
        if self.poll_attempts == 0 || self.poll_interval_secs == 0 {
            return Err(ValidationError::InvalidPollBudget);
        }
        Ok(())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            vector_store_id: None,
            model: default_model(),
            base_url: default_base_url(),
            name: default_name(),
            instructions: default_instructions(),
            poll_interval_secs: default_poll_interval(),
            poll_attempts: default_poll_attempts(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_name() -> String {
    "Customer Support Assistant".to_string()
}

fn default_instructions() -> String {
    "You are a helpful and kind customer service executive. \
     Prefer answering from the company documents in the knowledge collection. \
     If not found, use your general knowledge."
        .to_string()
}

fn default_poll_interval() -> u64 {
    1
}

fn default_poll_attempts() -> u32 {
    60
}

fn default_request_timeout() -> u64 {
    30
}
