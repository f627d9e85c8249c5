//! HTTP adapter for the chat endpoint.
//!
//! - `POST /chat` - Relay one message through the turn orchestrator
//! - `GET /health` - Liveness probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{ChatRequest, ChatResponse, ErrorResponse};
pub use handlers::ChatAppState;
pub use routes::routes;
