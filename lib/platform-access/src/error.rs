//! Error types for the platform-access crate.
//!
//! Variants carry enough detail for logs. User-facing layers must collapse
//! them into one generic message so a caller cannot tell an unknown user from
//! a wrong password.

use std::fmt;

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// Unknown username or wrong password.
    InvalidCredentials,
    /// The assertion names a provider that is not registered.
    ProviderNotEnabled { provider: String },
    /// The provider supplied no usable identifier.
    MissingClaim { claim: String },
    /// The credential store could not hash or compare a password.
    CredentialStore { reason: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => {
                write!(f, "invalid username or password")
            }
            Self::ProviderNotEnabled { provider } => {
                write!(f, "OAuth2 provider '{provider}' is not enabled")
            }
            Self::MissingClaim { claim } => {
                write!(f, "missing required claim: {claim}")
            }
            Self::CredentialStore { reason } => {
                write!(f, "credential store error: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_display_is_generic() {
        let msg = AuthenticationError::InvalidCredentials.to_string();
        assert_eq!(msg, "invalid username or password");
    }

    #[test]
    fn provider_not_enabled_display() {
        let err = AuthenticationError::ProviderNotEnabled {
            provider: "github".to_string(),
        };
        assert!(err.to_string().contains("github"));
        assert!(err.to_string().contains("not enabled"));
    }

    #[test]
    fn missing_claim_display() {
        let err = AuthenticationError::MissingClaim {
            claim: "email".to_string(),
        };
        assert!(err.to_string().contains("missing required claim"));
        assert!(err.to_string().contains("email"));
    }
}
