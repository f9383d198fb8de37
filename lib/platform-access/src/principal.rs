//! The authenticated principal produced by a login.

use crate::claims::ClaimSet;
use rolebridge_core::{GrantedAuthorities, UserKey};
use serde::{Deserialize, Serialize};

/// An authenticated identity with its resolved authorities.
///
/// Built fresh for every login. `claims` is present only for OAuth2/OIDC
/// logins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    user_key: UserKey,
    display_name: String,
    authorities: GrantedAuthorities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    claims: Option<ClaimSet>,
}

impl Principal {
    /// Creates a principal for a form login.
    #[must_use]
    pub fn form(user_key: UserKey, username: &str, authorities: GrantedAuthorities) -> Self {
        Self {
            user_key,
            display_name: username.to_string(),
            authorities,
            claims: None,
        }
    }

    /// Creates a principal for an OAuth2/OIDC login.
    #[must_use]
    pub fn oauth(
        user_key: UserKey,
        display_name: String,
        authorities: GrantedAuthorities,
        claims: ClaimSet,
    ) -> Self {
        Self {
            user_key,
            display_name,
            authorities,
            claims: Some(claims),
        }
    }

    /// Returns the canonical key the authorities were resolved for.
    #[must_use]
    pub fn user_key(&self) -> &UserKey {
        &self.user_key
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn authorities(&self) -> &GrantedAuthorities {
        &self.authorities
    }

    /// Returns the raw claims of an OAuth2/OIDC login.
    #[must_use]
    pub fn claims(&self) -> Option<&ClaimSet> {
        self.claims.as_ref()
    }

    /// Returns true if the principal holds the named authority.
    #[must_use]
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}
