//! Application layer - orchestration between ports.
//!
//! Coordinates the session directory and the turn orchestrator; contains no
//! provider-specific or transport-specific code.

pub mod orchestrator;
pub mod session_directory;

pub use orchestrator::{
    PollConfig, TurnError, TurnOrchestrator, TurnOutcome, TurnReply, NO_ANSWER_REPLY,
    RUN_FAILED_REPLY, TIMEOUT_REPLY,
};
pub use session_directory::{SessionDirectory, SessionDirectoryError};
