//! Session Store Port - Interface for the user-to-thread directory.
//!
//! Maps each opaque user id to the thread that holds their dialogue history.
//! The mapping is write-once per user: entries are never rotated or expired.

use async_trait::async_trait;

use crate::domain::foundation::{ThreadId, UserId};

/// Errors that can occur during session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Port for storing the user-to-thread mapping.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the thread stored for a user, if any.
    async fn get(&self, user: &UserId) -> Result<Option<ThreadId>, SessionStoreError>;

    /// Stores the thread for a user. Overwrites are not expected; callers
    /// must check-then-insert under the per-user turn lock.
    async fn insert(&self, user: UserId, thread: ThreadId) -> Result<(), SessionStoreError>;

    /// Number of tracked sessions. Exposed so deployments can watch
    /// unbounded growth (sessions are never evicted).
    async fn len(&self) -> Result<usize, SessionStoreError>;
}
