//! Error types for the authorization service.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rootcause::prelude::Report;
use serde_json::json;
use std::fmt;

/// Role assignment storage errors.
#[derive(Debug)]
pub enum RepositoryError {
    /// The database query failed.
    Database { details: String },
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database { details } => write!(f, "role assignment query failed: {details}"),
        }
    }
}

impl std::error::Error for RepositoryError {}

/// An error returned from an HTTP handler.
///
/// The report is logged; the caller only sees a generic message.
#[derive(Debug)]
pub struct ApiError(Report<RepositoryError>);

impl From<Report<RepositoryError>> for ApiError {
    fn from(report: Report<RepositoryError>) -> Self {
        Self(report)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "role lookup failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "internal server error" })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_details() {
        let err = RepositoryError::Database {
            details: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn api_error_is_generic_500() {
        let report: Report<RepositoryError> = RepositoryError::Database {
            details: "password authentication failed for user \"authz\"".to_string(),
        }
        .into();

        let response = ApiError::from(report).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
