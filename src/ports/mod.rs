//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application core and the outside world. Adapters implement them.
//!
//! - `AssistantBackend` - The hosted assistant service (threads, runs, steps)
//! - `SessionStore` - Storage for the user-to-thread directory

mod assistant_backend;
mod session_store;

pub use assistant_backend::{
    AssistantBackend, AssistantMessage, AssistantSpec, BackendError, MessageRole, RunStatus,
    RunStep, StepDetails,
};
pub use session_store::{SessionStore, SessionStoreError};
