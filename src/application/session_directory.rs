//! SessionDirectory - per-user conversation handles with turn serialization.
//!
//! Each user gets exactly one backend thread, created lazily on first
//! contact and reused for every later turn. The directory also hands out
//! per-user turn locks so that get-or-create and the whole
//! submit/poll/extract sequence are atomic with respect to other requests
//! from the same user. Cross-user traffic stays fully parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::foundation::{ThreadId, UserId};
use crate::ports::{AssistantBackend, BackendError, SessionStore, SessionStoreError};

/// Errors from resolving a user's conversation handle.
#[derive(Debug, thiserror::Error)]
pub enum SessionDirectoryError {
    #[error("session store error: {0}")]
    Store(#[from] SessionStoreError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Directory mapping users to their conversation threads.
pub struct SessionDirectory {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn AssistantBackend>,
    /// Lazily-populated per-user locks. Grows with the session map and is
    /// never pruned, same lifetime policy as the sessions themselves.
    turn_locks: Mutex<HashMap<UserId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionDirectory {
    /// Creates a directory backed by the given store and backend.
    pub fn new(store: Arc<dyn SessionStore>, backend: Arc<dyn AssistantBackend>) -> Self {
        Self {
            store,
            backend,
            turn_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the turn lock for a user, creating it on first sight.
    ///
    /// Callers hold the lock across an entire turn; the registry mutex
    /// itself is only held for the lookup.
    pub fn turn_lock(&self, user: &UserId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.turn_locks.lock().expect("turn lock registry poisoned");
        locks
            .entry(user.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Returns the user's thread, creating one on first contact.
    ///
    /// Must be called with the user's turn lock held, which makes the
    /// check-then-insert race-free per user.
    pub async fn get_or_create(&self, user: &UserId) -> Result<ThreadId, SessionDirectoryError> {
        if let Some(thread) = self.store.get(user).await? {
            return Ok(thread);
        }

        let thread = self.backend.create_thread().await?;
        tracing::debug!(user = %user, thread = %thread, "created conversation thread");
        self.store.insert(user.clone(), thread.clone()).await?;
        Ok(thread)
    }

    /// Number of tracked sessions.
    pub async fn session_count(&self) -> Result<usize, SessionDirectoryError> {
        Ok(self.store.len().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemorySessionStore, MockAssistantBackend};

    fn directory(backend: MockAssistantBackend) -> SessionDirectory {
        SessionDirectory::new(Arc::new(InMemorySessionStore::new()), Arc::new(backend))
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn repeated_calls_reuse_the_same_thread() {
        let backend = MockAssistantBackend::new();
        let directory = directory(backend.clone());

        let first = directory.get_or_create(&user("u1")).await.unwrap();
        let second = directory.get_or_create(&user("u1")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.create_thread_calls(), 1);
    }

    #[tokio::test]
    async fn distinct_users_get_distinct_threads() {
        let backend = MockAssistantBackend::new();
        let directory = directory(backend.clone());

        let t1 = directory.get_or_create(&user("u1")).await.unwrap();
        let t2 = directory.get_or_create(&user("u2")).await.unwrap();

        assert_ne!(t1, t2);
        assert_eq!(backend.create_thread_calls(), 2);
        assert_eq!(directory.session_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn backend_failure_propagates_and_stores_nothing() {
        let backend = MockAssistantBackend::new().with_failure(BackendError::network("down"));
        let directory = directory(backend.clone());

        let result = directory.get_or_create(&user("u1")).await;
        assert!(matches!(
            result,
            Err(SessionDirectoryError::Backend(BackendError::Network(_)))
        ));
        assert_eq!(directory.session_count().await.unwrap(), 0);

        // Next attempt succeeds and creates the thread.
        assert!(directory.get_or_create(&user("u1")).await.is_ok());
        assert_eq!(directory.session_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn turn_lock_is_stable_per_user() {
        let directory = directory(MockAssistantBackend::new());

        let a = directory.turn_lock(&user("u1"));
        let b = directory.turn_lock(&user("u1"));
        let c = directory.turn_lock(&user("u2"));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
