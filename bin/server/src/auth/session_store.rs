//! In-memory session storage.

use chrono::Duration;
use rolebridge_platform_access::{Principal, Session, SessionId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Sessions of logged-in users, keyed by id.
///
/// Cheap to clone; clones share the same map.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and stores a session for `principal`.
    pub async fn create(&self, principal: Principal, duration: Duration) -> Session {
        let session = Session::new(SessionId::generate(), principal, duration);
        self.sessions
            .write()
            .await
            .insert(session.id().clone(), session.clone());
        session
    }

    /// Returns a live session. An expired session is removed and not
    /// returned.
    pub async fn find(&self, id: &SessionId) -> Option<Session> {
        let session = self.sessions.read().await.get(id).cloned()?;
        if session.is_expired() {
            self.delete(id).await;
            return None;
        }
        Some(session)
    }

    /// Removes a session. Returns true if it existed.
    pub async fn delete(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Removes every expired session and returns how many were removed.
    pub async fn delete_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.is_valid());
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
