//! Transport session lifecycle
//!
//! Maps opaque session identifiers to open transport handles. The store is an
//! explicitly owned value handed to the HTTP front end, never ambient state;
//! tests hold their own clone to observe the table. Identifiers are random
//! UUIDs, so a removed identifier is never handed out again within a process.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Messages delivered over a session's event stream.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    JsonRpc(String),
}

/// One open session: an identifier bound to one transport handle.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            id: Uuid::new_v4().to_string(),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn send(&self, event: SessionEvent) -> bool {
        self.event_tx.send(event).is_ok()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session and return its identifier.
    pub async fn put(&self, session: Session) -> String {
        let id = session.id.clone();
        let mut sessions = self.sessions.write().await;
        sessions.insert(id.clone(), session);
        id
    }

    pub async fn contains(&self, id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(id)
    }

    pub async fn subscribe(&self, id: &str) -> Option<broadcast::Receiver<SessionEvent>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(Session::subscribe)
    }

    /// Deliver an event to a session's stream. Returns false when the session
    /// is unknown or nobody is listening.
    pub async fn send(&self, id: &str, event: SessionEvent) -> bool {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|s| s.send(event)).unwrap_or(false)
    }

    pub async fn remove(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id).is_some();
        if removed {
            info!(session_id = %id, "session removed");
        }
        removed
    }

    pub async fn count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}

/// Removes its session when dropped. Held inside the legacy event stream so
/// a client disconnect tears the session down.
pub struct SessionGuard {
    store: SessionStore,
    id: String,
}

impl SessionGuard {
    pub fn new(store: SessionStore, id: String) -> Self {
        Self { store, id }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let store = self.store.clone();
        let id = std::mem::take(&mut self.id);
        tokio::spawn(async move {
            if store.remove(&id).await {
                debug!(session_id = %id, "event stream closed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn put_and_remove_round_trip() {
        let store = SessionStore::new();
        let id = store.put(Session::new()).await;

        assert!(store.contains(&id).await);
        assert_eq!(store.count().await, 1);

        assert!(store.remove(&id).await);
        assert!(!store.contains(&id).await);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn removed_id_is_unknown_afterwards() {
        let store = SessionStore::new();
        let id = store.put(Session::new()).await;
        store.remove(&id).await;

        assert!(!store.remove(&id).await);
        assert!(store.subscribe(&id).await.is_none());
    }

    #[tokio::test]
    async fn ids_are_unique_across_sessions() {
        let store = SessionStore::new();
        let first = store.put(Session::new()).await;
        let second = store.put(Session::new()).await;

        assert_ne!(first, second);
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn send_reaches_subscriber() {
        let store = SessionStore::new();
        let id = store.put(Session::new()).await;
        let mut receiver = store.subscribe(&id).await.expect("session exists");

        assert!(
            store
                .send(&id, SessionEvent::JsonRpc("{}".to_string()))
                .await
        );

        let SessionEvent::JsonRpc(delivered) = receiver.recv().await.expect("event delivered");
        assert_eq!(delivered, "{}");
    }

    #[tokio::test]
    async fn send_to_unknown_session_is_rejected() {
        let store = SessionStore::new();

        assert!(
            !store
                .send("missing", SessionEvent::JsonRpc("{}".to_string()))
                .await
        );
    }

    #[tokio::test]
    async fn guard_drop_removes_session() {
        let store = SessionStore::new();
        let id = store.put(Session::new()).await;

        let guard = SessionGuard::new(store.clone(), id.clone());
        drop(guard);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!store.contains(&id).await);
    }
}
