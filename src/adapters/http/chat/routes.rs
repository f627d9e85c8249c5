//! Route definitions for the chat endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{chat, health, ChatAppState};

/// Create the chat router.
///
/// # Endpoints
///
/// - `POST /chat` - Relay a message and return the assistant's answer
/// - `GET /health` - Liveness probe
pub fn routes() -> Router<ChatAppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
}
