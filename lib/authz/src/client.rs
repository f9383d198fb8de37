//! HTTP client for the authorization service.

use crate::error::AuthzError;
use crate::types::{HealthResponse, RolesPayload};
use async_trait::async_trait;
use reqwest::Url;
use rolebridge_core::{GrantedAuthorities, UserKey};
use rootcause::prelude::Report;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default bound on a single role lookup, connect included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(300);

const API_PREFIX: [&str; 2] = ["api", "authorization"];

/// Resolves the roles assigned to a canonical user key.
///
/// Implementations must be fail-closed: any failure yields an empty set and
/// is never surfaced to the caller.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    /// Returns the roles assigned to `key`, or an empty set on any failure.
    async fn fetch_roles(&self, key: &UserKey) -> GrantedAuthorities;
}

/// Client for the authorization service's read API.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct AuthzClient {
    http: reqwest::Client,
    base_url: Option<Url>,
}

impl AuthzClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Service root, e.g. `http://localhost:8081`. A path
    ///   prefix is kept and the API path appended to it.
    /// * `timeout` - Bound on each request, connection included.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unparseable or cannot carry a path.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Report<AuthzError>> {
        let base_url = Url::parse(base_url).map_err(|e| AuthzError::InvalidUrl {
            details: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AuthzError::InvalidUrl {
                details: format!("'{}' cannot be used as a base URL", base_url),
            }
            .into());
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| AuthzError::RequestFailed {
                details: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: Some(base_url),
        })
    }

    /// Creates a client with no service behind it.
    ///
    /// Every lookup yields an empty set, so users authenticate with only the
    /// authorities their login method grants.
    #[must_use]
    pub fn disabled() -> Self {
        warn!("authorization service URL not configured; all users will resolve to no stored roles");
        Self {
            http: reqwest::Client::new(),
            base_url: None,
        }
    }

    /// Returns true if a service URL is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, Report<AuthzError>> {
        let mut url = self.base_url.clone().ok_or(AuthzError::NotConfigured)?;
        // Each segment is percent-encoded individually, so '/', '?', '#' and
        // '%' inside a user key cannot change the request path.
        url.path_segments_mut()
            .map_err(|()| AuthzError::InvalidUrl {
                details: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    /// Fetches the roles for `key`, reporting why a lookup failed.
    ///
    /// Issues exactly one request and never retries.
    #[instrument(skip(self), fields(user_key = %key))]
    pub async fn try_fetch_roles(
        &self,
        key: &UserKey,
    ) -> Result<GrantedAuthorities, Report<AuthzError>> {
        let url = self.endpoint(&["roles", key.as_str()])?;

        let response = self.http.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthzError::UnexpectedStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let payload: RolesPayload = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AuthzError::Timeout
            } else {
                AuthzError::MalformedResponse {
                    details: e.to_string(),
                }
            }
        })?;

        let roles: GrantedAuthorities = payload
            .roles
            .ok_or(AuthzError::MissingRoles)?
            .into_iter()
            .collect();

        debug!(count = roles.len(), "retrieved roles");
        Ok(roles)
    }

    /// Probes the service's health endpoint.
    pub async fn health(&self) -> Result<HealthResponse, Report<AuthzError>> {
        let url = self.endpoint(&["health"])?;
        let response = self.http.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthzError::UnexpectedStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let health = response
            .json()
            .await
            .map_err(|e| AuthzError::MalformedResponse {
                details: e.to_string(),
            })?;
        Ok(health)
    }
}

#[async_trait]
impl RoleLookup for AuthzClient {
    async fn fetch_roles(&self, key: &UserKey) -> GrantedAuthorities {
        match self.try_fetch_roles(key).await {
            Ok(roles) => roles,
            Err(report) => {
                if self.is_enabled() {
                    warn!(user_key = %key, error = %report, "failed to retrieve roles; continuing with none");
                } else {
                    debug!(user_key = %key, "authorization service disabled; no stored roles");
                }
                GrantedAuthorities::empty()
            }
        }
    }
}

fn request_error(e: reqwest::Error) -> AuthzError {
    if e.is_timeout() {
        AuthzError::Timeout
    } else {
        AuthzError::RequestFailed {
            details: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Path,
        http::StatusCode,
        routing::get,
    };
    use rolebridge_core::{build_form_key, build_oauth_key};
    use serde_json::json;
    use std::time::Instant;

    const ROLES_ROUTE: &str = "/api/authorization/roles/{user_identifier}";

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub");
        let addr = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("stub server");
        });
        format!("http://{addr}")
    }

    fn client(base: &str) -> AuthzClient {
        AuthzClient::new(base, Duration::from_millis(500)).expect("valid client")
    }

    fn roles_stub(roles: &'static [&'static str]) -> Router {
        Router::new().route(
            ROLES_ROUTE,
            get(move |Path(id): Path<String>| async move {
                Json(json!({"userIdentifier": id, "roles": roles}))
            }),
        )
    }

    #[tokio::test]
    async fn returns_assigned_roles() {
        let base = spawn_stub(roles_stub(&["ROLE_ADMIN", "ROLE_USER"])).await;

        let roles = client(&base).fetch_roles(&build_form_key("admin")).await;

        assert_eq!(roles.len(), 2);
        assert!(roles.contains("ROLE_ADMIN"));
        assert!(roles.contains("ROLE_USER"));
    }

    #[tokio::test]
    async fn duplicate_role_names_collapse() {
        let base = spawn_stub(roles_stub(&["ROLE_ADMIN", "ROLE_ADMIN"])).await;

        let roles = client(&base).fetch_roles(&build_form_key("admin")).await;

        assert_eq!(roles.len(), 1);
    }

    #[tokio::test]
    async fn unknown_key_yields_empty_set() {
        let base = spawn_stub(roles_stub(&[])).await;

        let roles = client(&base)
            .try_fetch_roles(&build_oauth_key("github", "nobody@example.com"))
            .await
            .expect("lookup succeeds");

        assert!(roles.is_empty());
    }

    #[tokio::test]
    async fn key_is_sent_as_single_encoded_segment() {
        let router = Router::new().route(
            ROLES_ROUTE,
            get(|Path(id): Path<String>| async move {
                Json(json!({"userIdentifier": id.clone(), "roles": [id]}))
            }),
        );
        let base = spawn_stub(router).await;
        let key = build_form_key("odd/name?#%");

        let roles = client(&base).try_fetch_roles(&key).await.expect("lookup");

        assert!(roles.contains("form:odd/name?#%"));
    }

    #[tokio::test]
    async fn base_url_path_prefix_is_kept() {
        let router = Router::new().nest("/authz", roles_stub(&["ROLE_USER"]));
        let base = spawn_stub(router).await;

        let roles = client(&format!("{base}/authz/"))
            .try_fetch_roles(&build_form_key("alice"))
            .await
            .expect("lookup");

        assert!(roles.contains("ROLE_USER"));
    }

    #[tokio::test]
    async fn server_error_fails_closed() {
        let router = Router::new().route(
            ROLES_ROUTE,
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn_stub(router).await;
        let client = client(&base);
        let key = build_form_key("admin");

        let err = client.try_fetch_roles(&key).await.unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(client.fetch_roles(&key).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_fails_closed() {
        let router = Router::new().route(ROLES_ROUTE, get(|| async { "not json" }));
        let base = spawn_stub(router).await;

        let roles = client(&base).fetch_roles(&build_form_key("admin")).await;

        assert!(roles.is_empty());
    }

    #[tokio::test]
    async fn missing_roles_field_fails_closed() {
        let router = Router::new().route(
            ROLES_ROUTE,
            get(|| async { Json(json!({"userIdentifier": "form:admin"})) }),
        );
        let base = spawn_stub(router).await;
        let client = client(&base);
        let key = build_form_key("admin");

        let err = client.try_fetch_roles(&key).await.unwrap_err();
        assert!(err.to_string().contains("roles"));
        assert!(client.fetch_roles(&key).await.is_empty());
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let router = Router::new().route(
            ROLES_ROUTE,
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"roles": ["ROLE_ADMIN"]}))
            }),
        );
        let base = spawn_stub(router).await;
        let client = AuthzClient::new(&base, Duration::from_millis(100)).expect("client");

        let started = Instant::now();
        let roles = client.fetch_roles(&build_form_key("admin")).await;

        assert!(roles.is_empty());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn unreachable_service_fails_closed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("address");
        drop(listener);

        let roles = client(&format!("http://{addr}"))
            .fetch_roles(&build_form_key("admin"))
            .await;

        assert!(roles.is_empty());
    }

    #[tokio::test]
    async fn disabled_client_returns_no_roles() {
        let client = AuthzClient::disabled();
        assert!(!client.is_enabled());

        let err = client
            .try_fetch_roles(&build_form_key("admin"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));
        assert!(client.fetch_roles(&build_form_key("admin")).await.is_empty());
    }

    #[test]
    fn rejects_unparseable_url() {
        assert!(AuthzClient::new("not a url", DEFAULT_TIMEOUT).is_err());
        assert!(AuthzClient::new("mailto:authz@example.com", DEFAULT_TIMEOUT).is_err());
    }

    #[tokio::test]
    async fn health_reports_up() {
        let router = Router::new().route(
            "/api/authorization/health",
            get(|| async { Json(HealthResponse::up()) }),
        );
        let base = spawn_stub(router).await;

        let health = client(&base).health().await.expect("healthy");

        assert_eq!(health, HealthResponse::up());
    }
}
