//! Adapters - implementations of the ports against concrete technology.
//!
//! - `ai` - Assistant backend implementations (OpenAI Assistants API, mock)
//! - `http` - Axum REST surface
//! - `storage` - Session store implementations

pub mod ai;
pub mod http;
pub mod storage;

// Re-export key types for convenience
pub use ai::{MockAssistantBackend, OpenAIAssistantsBackend, OpenAIAssistantsConfig};
pub use http::ChatAppState;
pub use storage::InMemorySessionStore;
