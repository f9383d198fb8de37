//! Application wiring: state construction and the router.

use crate::auth::{self, AppState, ProviderClients};
use crate::config::ServerConfig;
use crate::error::StartupError;
use axum::Router;
use axum::routing::{get, post};
use rolebridge_authz::{AuthzClient, RoleLookup};
use rolebridge_platform_access::{
    Authenticator, CredentialStore, FormUser, InMemoryCredentialStore, ProviderRegistry,
};
use rootcause::prelude::Report;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the application state from configuration.
///
/// The provider registry, credential store and role lookup client are built
/// here once and shared read-only for the life of the process.
///
/// # Errors
///
/// Returns an error if configuration that is present is unusable.
pub fn build_state(config: &ServerConfig) -> Result<AppState, Report<StartupError>> {
    let registry = Arc::new(ProviderRegistry::from_credentials(
        &config.google_credentials(),
        &config.github_credentials(),
    ));

    if config.form_user.uses_default_password() {
        tracing::warn!(
            username = %config.form_user.username,
            "form user is using the default password; set FORM_USER__PASSWORD"
        );
    }
    let form_user = FormUser::with_password(
        config.form_user.username.clone(),
        &config.form_user.password,
        config.form_user.bcrypt_cost,
    )
    .map_err(|e| StartupError::Credentials {
        details: e.to_string(),
    })?;
    let credentials: Arc<dyn CredentialStore> =
        Arc::new(InMemoryCredentialStore::new([form_user]));

    let roles: Arc<dyn RoleLookup> = match &config.authorization_service_url {
        Some(url) if !url.trim().is_empty() => {
            let client = AuthzClient::new(url, config.authorization_timeout()).map_err(|e| {
                StartupError::AuthorizationClient {
                    details: e.to_string(),
                }
            })?;
            tracing::info!(%url, timeout_ms = config.authorization_timeout_ms, "authorization service configured");
            Arc::new(client)
        }
        _ => Arc::new(AuthzClient::disabled()),
    };

    let providers = ProviderClients::from_registry(&registry, |id| config.redirect_uri(id))
        .map_err(|e| StartupError::Providers {
            details: e.to_string(),
        })?;

    let authenticator = Authenticator::new(credentials, roles, registry);
    Ok(AppState::new(
        authenticator,
        providers,
        config.session.clone(),
    ))
}

/// Builds the router.
///
/// OAuth2 routes are mounted only when at least one provider is registered;
/// otherwise they do not exist.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new()
        .route("/", get(auth::routes::index))
        .route(
            "/login",
            get(auth::routes::login_options).post(auth::routes::form_login),
        )
        .route("/dashboard", get(auth::routes::dashboard))
        .route("/logout", post(auth::routes::logout));

    if state.oauth_login.is_some() {
        router = router
            .route(
                "/oauth2/authorization/{provider}",
                get(auth::routes::oauth_start),
            )
            .route(
                "/login/oauth2/code/{provider}",
                get(auth::routes::oauth_callback),
            );
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
