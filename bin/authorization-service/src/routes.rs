//! HTTP API of the authorization service.
//!
//! Internal only: no authentication is applied, so the listener must not be
//! reachable from outside the deployment.

use crate::error::ApiError;
use crate::service::AuthorizationService;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use rolebridge_authz::{HealthResponse, RolesResponse};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Builds the service router.
pub fn router(service: AuthorizationService) -> Router {
    Router::new()
        .route("/api/authorization/roles/{user_identifier}", get(roles))
        .route("/api/authorization/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn roles(
    State(service): State<AuthorizationService>,
    Path(user_identifier): Path<String>,
) -> Result<Json<RolesResponse>, ApiError> {
    info!(%user_identifier, "authorization request");

    let roles = service.roles_for_user(&user_identifier).await?;

    Ok(Json(RolesResponse {
        user_identifier,
        roles: roles.into_iter().collect(),
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::up())
}
