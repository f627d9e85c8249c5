//! In-Memory Session Store Adapter
//!
//! Stores the user-to-thread directory in process memory. All session state
//! is lost on restart; users simply start fresh threads.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ThreadId, UserId};
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory user-to-thread directory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<UserId, ThreadId>>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user: &UserId) -> Result<Option<ThreadId>, SessionStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(user).cloned())
    }

    async fn insert(&self, user: UserId, thread: ThreadId) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(user, thread);
        Ok(())
    }

    async fn len(&self) -> Result<usize, SessionStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn get_returns_none_for_unknown_user() {
        let store = InMemorySessionStore::new();
        assert_eq!(store.get(&user("u1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = InMemorySessionStore::new();
        store
            .insert(user("u1"), ThreadId::new("thread_1"))
            .await
            .unwrap();

        assert_eq!(
            store.get(&user("u1")).await.unwrap(),
            Some(ThreadId::new("thread_1"))
        );
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = InMemorySessionStore::new();
        store
            .insert(user("u1"), ThreadId::new("thread_1"))
            .await
            .unwrap();
        store
            .insert(user("u2"), ThreadId::new("thread_2"))
            .await
            .unwrap();

        assert_eq!(
            store.get(&user("u1")).await.unwrap(),
            Some(ThreadId::new("thread_1"))
        );
        assert_eq!(
            store.get(&user("u2")).await.unwrap(),
            Some(ThreadId::new("thread_2"))
        );
        assert_eq!(store.len().await.unwrap(), 2);
    }
}
