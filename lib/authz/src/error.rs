//! Authorization client error types.

use std::fmt;

/// Errors from a role lookup against the authorization service.
///
/// None of these reach the login flow: [`RoleLookup::fetch_roles`] turns
/// every variant into an empty authority set.
///
/// [`RoleLookup::fetch_roles`]: crate::RoleLookup::fetch_roles
#[derive(Debug)]
pub enum AuthzError {
    /// No authorization service URL is configured.
    NotConfigured,
    /// The configured base URL cannot address the roles endpoint.
    InvalidUrl {
        /// Error details.
        details: String,
    },
    /// The lookup did not complete within the client timeout.
    Timeout,
    /// The request could not be sent or the connection failed.
    RequestFailed {
        /// Error details.
        details: String,
    },
    /// The service answered with a non-success status.
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
    },
    /// The response body was not the expected JSON document.
    MalformedResponse {
        /// Error details.
        details: String,
    },
    /// The response body had no `roles` field.
    MissingRoles,
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "authorization service URL is not configured"),
            Self::InvalidUrl { details } => {
                write!(f, "invalid authorization service URL: {}", details)
            }
            Self::Timeout => write!(f, "authorization service lookup timed out"),
            Self::RequestFailed { details } => {
                write!(f, "authorization request failed: {}", details)
            }
            Self::UnexpectedStatus { status } => {
                write!(f, "authorization service returned status {}", status)
            }
            Self::MalformedResponse { details } => {
                write!(f, "malformed authorization response: {}", details)
            }
            Self::MissingRoles => write!(f, "authorization response has no 'roles' field"),
        }
    }
}

impl std::error::Error for AuthzError {}
