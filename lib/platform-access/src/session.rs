//! Session management for authenticated users.
//!
//! A session binds an opaque id, handed to the browser in a cookie, to the
//! [`Principal`] resolved at login. Authorities are not re-resolved while the
//! session lives.

use crate::principal::Principal;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh, unguessable session id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("sess_{}", Ulid::new()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An active authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    principal: Principal,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session valid for `duration` from now.
    #[must_use]
    pub fn new(id: SessionId, principal: Principal, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            principal,
            created_at: now,
            expires_at: now + duration,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns the principal resolved at login.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolebridge_core::build_form_key;

    fn principal() -> Principal {
        Principal::form(
            build_form_key("admin"),
            "admin",
            ["ROLE_ADMIN"].into_iter().collect(),
        )
    }

    #[test]
    fn session_id_display() {
        let id = SessionId::new("sess_test_123".to_string());
        assert_eq!(id.to_string(), "sess_test_123");
    }

    #[test]
    fn session_id_from_str() {
        let id: SessionId = "test_session".into();
        assert_eq!(id.as_str(), "test_session");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("sess_"));
    }

    #[test]
    fn new_session_has_correct_fields() {
        let id = SessionId::generate();
        let before = Utc::now();
        let session = Session::new(id.clone(), principal(), Duration::minutes(30));
        let after = Utc::now();

        assert_eq!(session.id(), &id);
        assert!(session.principal().has_authority("ROLE_ADMIN"));
        assert!(session.created_at() >= before);
        assert!(session.created_at() <= after);
        assert_eq!(
            session.expires_at() - session.created_at(),
            Duration::minutes(30)
        );
    }

    #[test]
    fn session_expiration() {
        let session = Session::new(SessionId::generate(), principal(), Duration::seconds(-1));

        assert!(session.is_expired());
        assert!(!session.is_valid());
    }

    #[test]
    fn session_not_expired() {
        let session = Session::new(SessionId::generate(), principal(), Duration::hours(1));

        assert!(!session.is_expired());
        assert!(session.is_valid());
    }
}
