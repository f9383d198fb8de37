//! Role assignment records.

use serde::{Deserialize, Serialize};

/// A named role, e.g. `ROLE_ADMIN`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

impl Role {
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Grants one role to one canonical user key.
///
/// `user_identifier` is stored exactly as the authentication side builds it
/// (`form:admin`, `google:user@example.com`); it is matched verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub id: i64,
    pub user_identifier: String,
    pub role: Role,
}

impl RoleAssignment {
    #[must_use]
    pub fn new(id: i64, user_identifier: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            user_identifier: user_identifier.into(),
            role,
        }
    }
}
