//! Authentication module for the rolebridge server.
//!
//! This module provides:
//! - Form login against the configured credential store
//! - OAuth2/OIDC login through the registered providers
//! - In-memory session management
//! - Authentication extractors for Axum routes
//!
//! # Authorization Model
//!
//! Authorities are resolved once, at login, by the [`Authenticator`]: the
//! login method's own authorities plus the roles the authorization service
//! stores for the user's canonical key. They are kept in the session and not
//! re-resolved until the next login.

pub mod client;
pub mod csrf;
pub mod middleware;
pub mod oauth;
pub mod oidc;
pub mod routes;
pub mod session_store;

pub use client::{AuthState, OAuthError, ProviderClient, ProviderClients};
pub use middleware::{AuthRejection, RequireAuth};
pub use session_store::SessionStore;

use crate::config::SessionConfig;
use rolebridge_platform_access::{Authenticator, OAuthLogin};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Auth state cookie name (CSRF, PKCE and nonce during an OAuth2 flow).
pub const AUTH_STATE_COOKIE: &str = "oauth2_auth_state";

/// Shared application state.
pub struct AppState {
    pub authenticator: Authenticator,
    /// Present only when at least one provider is registered.
    pub oauth_login: Option<OAuthLogin>,
    pub providers: ProviderClients,
    pub sessions: SessionStore,
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(
        authenticator: Authenticator,
        providers: ProviderClients,
        session_config: SessionConfig,
    ) -> Self {
        let oauth_login = authenticator.oauth_login();
        Self {
            authenticator,
            oauth_login,
            providers,
            sessions: SessionStore::new(),
            session_config,
        }
    }
}
