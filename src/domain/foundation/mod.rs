//! Foundation module - Shared domain primitives.
//!
//! Contains the identifier value objects and error types that form the
//! vocabulary of the relay: users, threads, runs, messages, assistants.

mod errors;
mod ids;

pub use errors::ValidationError;
pub use ids::{AssistantId, MessageId, RunId, ThreadId, UserId};
