//! Form-login credential verification.
//!
//! Passwords are stored only as bcrypt hashes. Verification is CPU-bound and
//! synchronous; async callers should run it on a blocking thread.

use crate::error::AuthenticationError;
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::fmt;

/// Verifies form-login credentials.
pub trait CredentialStore: Send + Sync {
    /// Returns `Ok(true)` only if `username` exists and `password` matches.
    ///
    /// An unknown user and a wrong password both return `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns an error only if a stored hash cannot be compared.
    fn verify(&self, username: &str, password: &str) -> Result<bool, Report<AuthenticationError>>;
}

/// A form-login user with a hashed password.
#[derive(Clone, PartialEq, Eq)]
pub struct FormUser {
    username: String,
    password_hash: String,
}

impl FormUser {
    /// Creates a user from an existing bcrypt hash.
    #[must_use]
    pub fn with_hash(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }

    /// Creates a user by hashing a plaintext password with the given bcrypt
    /// cost.
    ///
    /// # Errors
    ///
    /// Returns an error if the cost is out of range.
    pub fn with_password(
        username: impl Into<String>,
        password: &str,
        cost: u32,
    ) -> Result<Self, Report<AuthenticationError>> {
        let password_hash =
            bcrypt::hash(password, cost).map_err(|e| AuthenticationError::CredentialStore {
                reason: format!("password hashing failed: {e}"),
            })?;
        Ok(Self::with_hash(username, password_hash))
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for FormUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormUser")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Fixed set of form-login users held in memory.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    users: HashMap<String, FormUser>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new(users: impl IntoIterator<Item = FormUser>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn verify(&self, username: &str, password: &str) -> Result<bool, Report<AuthenticationError>> {
        let Some(user) = self.users.get(username) else {
            // Spend the same hashing work as for a known user.
            if let Some(any) = self.users.values().next() {
                let _ = bcrypt::verify(password, &any.password_hash);
            }
            return Ok(false);
        };

        let matches = bcrypt::verify(password, &user.password_hash).map_err(|e| {
            AuthenticationError::CredentialStore {
                reason: format!("stored hash for '{username}' is unusable: {e}"),
            }
        })?;
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the tests fast.
    const TEST_COST: u32 = 4;

    fn store() -> InMemoryCredentialStore {
        InMemoryCredentialStore::new([
            FormUser::with_password("admin", "admin123", TEST_COST).expect("hash")
        ])
    }

    #[test]
    fn correct_password_verifies() {
        assert!(store().verify("admin", "admin123").expect("verify"));
    }

    #[test]
    fn wrong_password_is_rejected() {
        assert!(!store().verify("admin", "wrong").expect("verify"));
    }

    #[test]
    fn unknown_user_is_rejected_without_error() {
        assert!(!store().verify("nobody", "admin123").expect("verify"));
    }

    #[test]
    fn empty_store_rejects_everyone() {
        let store = InMemoryCredentialStore::default();
        assert!(!store.verify("admin", "admin123").expect("verify"));
    }

    #[test]
    fn stored_hash_is_salted() {
        let a = FormUser::with_password("a", "same", TEST_COST).expect("hash");
        let b = FormUser::with_password("b", "same", TEST_COST).expect("hash");
        assert_ne!(a.password_hash, b.password_hash);
        assert!(!a.password_hash.contains("same"));
    }

    #[test]
    fn corrupt_hash_is_an_error() {
        let store = InMemoryCredentialStore::new([FormUser::with_hash("admin", "not-a-hash")]);
        assert!(store.verify("admin", "admin123").is_err());
    }

    #[test]
    fn debug_output_hides_hash() {
        let user = FormUser::with_password("admin", "admin123", TEST_COST).expect("hash");
        assert!(!format!("{user:?}").contains("$2"));
    }
}
