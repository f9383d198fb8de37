//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables. Nested values
//! use `__` as separator (`SESSION__DURATION_MINUTES`).

use rolebridge_platform_access::ClientCredentials;
use serde::Deserialize;
use std::time::Duration;

/// Default form-login password. Logged as a warning when still in use.
pub const DEFAULT_FORM_PASSWORD: &str = "admin123";

/// Environment source for the server.
///
/// Values are left as strings and only converted when a numeric or boolean
/// field is deserialized, so secrets such as `FORM_USER__PASSWORD=0071` are
/// read verbatim.
fn environment() -> config::Environment {
    config::Environment::default().separator("__")
}

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Externally visible root URL, used to build OAuth2 redirect URIs.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub google_client_id: Option<String>,
    #[serde(default)]
    pub google_client_secret: Option<String>,
    #[serde(default)]
    pub github_client_id: Option<String>,
    #[serde(default)]
    pub github_client_secret: Option<String>,

    /// Root URL of the authorization service. When absent, no stored roles
    /// are ever granted.
    #[serde(default)]
    pub authorization_service_url: Option<String>,

    /// Bound on each role lookup, in milliseconds.
    #[serde(default = "default_authorization_timeout_ms")]
    pub authorization_timeout_ms: u64,

    /// The form-login user.
    #[serde(default)]
    pub form_user: FormUserConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_authorization_timeout_ms() -> u64 {
    u64::try_from(rolebridge_authz::DEFAULT_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(environment())
    }

    fn from_environment(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    #[must_use]
    pub fn google_credentials(&self) -> ClientCredentials {
        ClientCredentials::new(
            self.google_client_id.clone(),
            self.google_client_secret.clone(),
        )
    }

    #[must_use]
    pub fn github_credentials(&self) -> ClientCredentials {
        ClientCredentials::new(
            self.github_client_id.clone(),
            self.github_client_secret.clone(),
        )
    }

    #[must_use]
    pub fn authorization_timeout(&self) -> Duration {
        Duration::from_millis(self.authorization_timeout_ms)
    }

    /// Returns the callback URI registered with a provider.
    #[must_use]
    pub fn redirect_uri(&self, provider_id: &str) -> String {
        format!(
            "{}/login/oauth2/code/{provider_id}",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// The single form-login user.
#[derive(Debug, Clone, Deserialize)]
pub struct FormUserConfig {
    #[serde(default = "default_form_username")]
    pub username: String,
    #[serde(default = "default_form_password")]
    pub password: String,
    /// bcrypt work factor for the stored hash.
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_form_username() -> String {
    "admin".to_string()
}

fn default_form_password() -> String {
    DEFAULT_FORM_PASSWORD.to_string()
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for FormUserConfig {
    fn default() -> Self {
        Self {
            username: default_form_username(),
            password: default_form_password(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl FormUserConfig {
    #[must_use]
    pub fn uses_default_password(&self) -> bool {
        self.password == DEFAULT_FORM_PASSWORD
    }
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_session_duration_minutes() -> i64 {
    30
}

fn default_cleanup_interval_seconds() -> u64 {
    300
}

fn default_secure_cookies() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
            secure_cookies: default_secure_cookies(),
        }
    }
}
