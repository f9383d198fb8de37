//! Canonical user keys.
//!
//! A [`UserKey`] is the only join key between an authenticated identity and
//! the role assignments held by the authorization service. Its format,
//! `"<source>:<identifier>"`, is a compatibility boundary: assignments are
//! persisted against the exact string, so the separator and casing must not
//! change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source name used for form-login identities.
pub const FORM_SOURCE: &str = "form";

const SEPARATOR: char = ':';

/// Error returned when parsing a user key from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError {
    /// The rejected input.
    pub input: String,
    /// The reason for the parse failure.
    pub reason: &'static str,
}

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid user key '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseKeyError {}

/// Canonical `"<source>:<identifier>"` user key.
///
/// The source is the login mechanism (`form`, or an OAuth2 provider id such
/// as `google`); the identifier is the username or the provider-supplied
/// email. The split point is always the first colon, so identifiers may
/// themselves contain colons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    fn from_parts(source: &str, identifier: &str) -> Self {
        Self(format!("{source}{SEPARATOR}{identifier}"))
    }

    /// Parses an existing key, splitting at the first colon.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no colon or the source part is empty.
    pub fn parse(s: &str) -> Result<Self, ParseKeyError> {
        match s.split_once(SEPARATOR) {
            Some((source, _)) if !source.is_empty() => Ok(Self(s.to_string())),
            Some(_) => Err(ParseKeyError {
                input: s.to_string(),
                reason: "empty source",
            }),
            None => Err(ParseKeyError {
                input: s.to_string(),
                reason: "missing ':' separator",
            }),
        }
    }

    /// Returns the source part (everything before the first colon).
    #[must_use]
    pub fn source(&self) -> &str {
        self.split().0
    }

    /// Returns the identifier part (everything after the first colon).
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.split().1
    }

    /// Returns the full key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn split(&self) -> (&str, &str) {
        // Every constructor guarantees a separator.
        self.0.split_once(SEPARATOR).unwrap_or((&self.0, ""))
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for UserKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds the key for a form-login user: `"form:" + username`.
///
/// The username is opaque; an empty username yields `"form:"`.
#[must_use]
pub fn build_form_key(username: &str) -> UserKey {
    UserKey::from_parts(FORM_SOURCE, username)
}

/// Builds the key for an OAuth2/OIDC user: `provider_id + ":" + identifier`.
///
/// The identifier is normally the verified email. Callers choose a stable
/// substitute before calling when the provider did not supply one.
#[must_use]
pub fn build_oauth_key(provider_id: &str, identifier: &str) -> UserKey {
    UserKey::from_parts(provider_id, identifier)
}
