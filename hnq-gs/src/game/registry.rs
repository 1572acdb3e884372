//! Live session registry
//!
//! Each session sits behind its own mutex, so one player's transitions never
//! contend with another's and no state is shared across sessions. The map lock
//! is only held long enough to look a session up.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::session::GameSession;

pub type SessionHandle = Arc<Mutex<GameSession>>;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a session reachable under `id`
    pub async fn insert(&self, id: Uuid, session: GameSession) -> SessionHandle {
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    pub async fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session; returns whether it existed
    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hnq_common::ItemRecord;

    fn playing() -> GameSession {
        GameSession::new(vec![ItemRecord::new(1, "Story", 10)]).unwrap()
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty().await);

        let id = Uuid::new_v4();
        let handle = registry.insert(id, playing()).await;
        assert_eq!(handle.lock().await.items().len(), 1);
        assert!(registry.get(&id).await.is_some());
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
        assert!(registry.get(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let registry = SessionRegistry::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        registry.insert(a, playing()).await;
        registry.insert(b, playing()).await;
        assert_eq!(registry.len().await, 2);

        let handle_a = registry.get(&a).await.unwrap();
        let handle_b = registry.get(&b).await.unwrap();
        assert!(!Arc::ptr_eq(&handle_a, &handle_b));
    }
}
