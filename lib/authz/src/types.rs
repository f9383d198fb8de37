//! Wire types of the authorization service's HTTP API.
//!
//! Shared by the client and the service so both sides agree on field names.

use serde::{Deserialize, Serialize};

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "authorization-service";

/// Body of `GET /api/authorization/roles/{userIdentifier}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolesResponse {
    /// The canonical user key the roles were resolved for.
    pub user_identifier: String,
    /// Distinct role names; empty for an unknown key.
    pub roles: Vec<String>,
}

/// Body of `GET /api/authorization/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl HealthResponse {
    /// The response of a live service.
    #[must_use]
    pub fn up() -> Self {
        Self {
            status: "UP".to_string(),
            service: SERVICE_NAME.to_string(),
        }
    }
}

/// Lenient view of a roles response used by the client.
///
/// Only `roles` matters to the caller; its absence is reported separately
/// from an undecodable body.
#[derive(Debug, Deserialize)]
pub(crate) struct RolesPayload {
    #[serde(default)]
    pub(crate) roles: Option<Vec<String>>,
}
