//! HTTP handlers for the chat endpoint.
//!
//! These handlers connect Axum routes to the turn orchestrator.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::TurnOrchestrator;
use crate::domain::foundation::UserId;

use super::dto::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};

/// Shared application state containing all dependencies.
#[derive(Clone)]
pub struct ChatAppState {
    pub orchestrator: Arc<TurnOrchestrator>,
}

impl ChatAppState {
    pub fn new(orchestrator: Arc<TurnOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Relay one chat message and return the sanitized answer.
///
/// POST /chat
pub async fn chat(
    State(app_state): State<ChatAppState>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let user = UserId::new(req.user_id).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(e.to_string())),
        )
    })?;

    if req.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("Message cannot be empty")),
        ));
    }

    // Degraded outcomes (run failure, timeout, no answer) are still chat
    // answers; only backend faults become protocol-level errors.
    let reply = app_state
        .orchestrator
        .submit_turn(&user, &req.message)
        .await
        .map_err(|e| {
            tracing::error!(user = %user, error = %e, "turn aborted by backend fault");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::bad_gateway(e.to_string())),
            )
        })?;

    Ok::<_, (StatusCode, Json<ErrorResponse>)>((
        StatusCode::OK,
        Json(ChatResponse {
            answer: reply.answer,
        }),
    ))
}

/// Liveness probe.
///
/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
