//! HTTP-facing error types for the server.
//!
//! Detail is logged; clients only see a generic message, so a response never
//! reveals why a login failed.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt;

/// Generic message for any failed form login.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Generic message for any failed OAuth2 login.
pub const OAUTH_FAILED_MESSAGE: &str = "Authentication failed";

/// Authentication errors.
#[derive(Debug)]
pub enum AuthError {
    /// Form login failed for any reason.
    InvalidCredentials(String),
    /// OAuth2 login failed for any reason.
    OAuthFailed(String),
    /// A form post carried no CSRF token or the wrong one.
    CsrfRejected(String),
    /// No client for the requested provider.
    UnknownProvider(String),
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidCredentials(detail) => {
                tracing::warn!(%detail, "form login failed");
                (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS_MESSAGE)
            }
            Self::OAuthFailed(detail) => {
                tracing::warn!(%detail, "OAuth2 login failed");
                (StatusCode::UNAUTHORIZED, OAUTH_FAILED_MESSAGE)
            }
            Self::CsrfRejected(detail) => {
                tracing::warn!(%detail, "form post rejected");
                (StatusCode::FORBIDDEN, "Forbidden")
            }
            Self::UnknownProvider(provider) => {
                tracing::debug!(%provider, "login requested for unknown provider");
                (StatusCode::NOT_FOUND, "Unknown provider")
            }
            Self::Internal(detail) => {
                tracing::error!(%detail, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Errors that prevent the server from starting.
#[derive(Debug)]
pub enum StartupError {
    /// The form user's password could not be hashed.
    Credentials { details: String },
    /// The authorization service URL is present but unusable.
    AuthorizationClient { details: String },
    /// A provider client could not be built.
    Providers { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials { details } => write!(f, "form user setup failed: {details}"),
            Self::AuthorizationClient { details } => {
                write!(f, "authorization client setup failed: {details}")
            }
            Self::Providers { details } => write!(f, "OAuth2 client setup failed: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}
