//! HTTP DTOs for the chat endpoint.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

/// Request to send one chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
}

/// Response carrying the assistant's answer.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            code: "UPSTREAM_ERROR".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_deserializes() {
        let json = r#"{"user_id":"u1","message":"Hello!"}"#;
        let req: ChatRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.user_id, "u1");
        assert_eq!(req.message, "Hello!");
    }

    #[test]
    fn chat_response_serializes_answer_only() {
        let resp = ChatResponse {
            answer: "Hi there".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();

        assert_eq!(json, r#"{"answer":"Hi there"}"#);
    }

    #[test]
    fn error_response_serialization() {
        let error = ErrorResponse::bad_request("message cannot be empty");
        let json = serde_json::to_string(&error).unwrap();

        assert!(json.contains("BAD_REQUEST"));
        assert!(json.contains("message cannot be empty"));
    }
}
