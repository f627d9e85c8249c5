//! AI adapters - implementations of the AssistantBackend port.

mod mock_backend;
mod openai_assistants;

pub use mock_backend::MockAssistantBackend;
pub use openai_assistants::{OpenAIAssistantsBackend, OpenAIAssistantsConfig};
