//! OAuth2/OIDC provider registration.
//!
//! Providers are registered once at startup from client credentials. A
//! provider whose client id or secret is missing is simply absent; when no
//! provider is present, OAuth2 login is not offered at all and only form
//! login remains.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Registration id of the Google provider.
pub const GOOGLE: &str = "google";

/// Registration id of the GitHub provider.
pub const GITHUB: &str = "github";

/// Protocol family of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenID Connect: verified ID token plus user info.
    Oidc,
    /// Plain OAuth2: user info endpoint only.
    OAuth2,
}

impl ProviderKind {
    /// Authority every user authenticated through this kind of provider holds.
    #[must_use]
    pub fn base_authority(&self) -> &'static str {
        match self {
            Self::Oidc => "OIDC_USER",
            Self::OAuth2 => "OAUTH2_USER",
        }
    }
}

/// Endpoints of an OAuth2/OIDC provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
    /// OIDC issuer, used for discovery. `None` for plain OAuth2 providers.
    pub issuer_url: Option<String>,
    pub authorization_uri: String,
    pub token_uri: String,
    pub user_info_uri: String,
    pub jwk_set_uri: Option<String>,
}

/// Fixed, credential-free description of a supported provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTemplate {
    id: &'static str,
    client_name: &'static str,
    kind: ProviderKind,
    scopes: &'static [&'static str],
    user_name_attribute: &'static str,
    endpoints: ProviderEndpoints,
    credential_vars: (&'static str, &'static str),
}

impl ProviderTemplate {
    /// Google, via OpenID Connect.
    #[must_use]
    pub fn google() -> Self {
        Self {
            id: GOOGLE,
            client_name: "Google",
            kind: ProviderKind::Oidc,
            scopes: &["openid", "profile", "email"],
            user_name_attribute: "sub",
            endpoints: ProviderEndpoints {
                issuer_url: Some("https://accounts.google.com".to_string()),
                authorization_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_uri: "https://www.googleapis.com/oauth2/v4/token".to_string(),
                user_info_uri: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
                jwk_set_uri: Some("https://www.googleapis.com/oauth2/v3/certs".to_string()),
            },
            credential_vars: ("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
        }
    }

    /// GitHub, via plain OAuth2.
    #[must_use]
    pub fn github() -> Self {
        Self {
            id: GITHUB,
            client_name: "GitHub",
            kind: ProviderKind::OAuth2,
            scopes: &["read:user", "user:email"],
            user_name_attribute: "id",
            endpoints: ProviderEndpoints {
                issuer_url: None,
                authorization_uri: "https://github.com/login/oauth/authorize".to_string(),
                token_uri: "https://github.com/login/oauth/access_token".to_string(),
                user_info_uri: "https://api.github.com/user".to_string(),
                jwk_set_uri: None,
            },
            credential_vars: ("GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
        }
    }

    /// Returns the registration id this template produces.
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.id
    }
}

/// Client id and secret for one provider, as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl ClientCredentials {
    #[must_use]
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    /// Returns true if both values are present and not blank.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        non_blank(self.client_id.as_deref()).is_some()
            && non_blank(self.client_secret.as_deref()).is_some()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// A live OAuth2/OIDC client registration.
///
/// Immutable for the life of the process.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderRegistration {
    id: String,
    client_name: String,
    client_id: String,
    client_secret: String,
    kind: ProviderKind,
    scopes: Vec<String>,
    user_name_attribute: String,
    endpoints: ProviderEndpoints,
}

impl ProviderRegistration {
    /// Registers a provider if both credentials are present and non-blank.
    ///
    /// Returns `None` otherwise; an unregistered provider is never an error.
    #[must_use]
    pub fn register(
        template: ProviderTemplate,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Option<Self> {
        let client_id = non_blank(client_id)?;
        let client_secret = non_blank(client_secret)?;

        Some(Self {
            id: template.id.to_string(),
            client_name: template.client_name.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            kind: template.kind,
            scopes: template.scopes.iter().map(|s| (*s).to_string()).collect(),
            user_name_attribute: template.user_name_attribute.to_string(),
            endpoints: template.endpoints,
        })
    }

    /// Returns the registration id (e.g. "google").
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the human-readable provider name.
    #[must_use]
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Returns the scopes requested at authorization time.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Returns the claim holding the provider's stable user identifier.
    #[must_use]
    pub fn user_name_attribute(&self) -> &str {
        &self.user_name_attribute
    }

    #[must_use]
    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }
}

impl fmt::Debug for ProviderRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("id", &self.id)
            .field("client_name", &self.client_name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("kind", &self.kind)
            .field("scopes", &self.scopes)
            .field("user_name_attribute", &self.user_name_attribute)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

/// The set of registered providers.
///
/// Built once at startup and then only read, so it can be shared across
/// requests without synchronization.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    registrations: Vec<ProviderRegistration>,
}

impl ProviderRegistry {
    /// Creates a registry from already-built registrations.
    #[must_use]
    pub fn new(registrations: Vec<ProviderRegistration>) -> Self {
        Self { registrations }
    }

    /// Registers Google and GitHub from their client credentials.
    ///
    /// Logs which providers are available; a missing provider is a warning.
    #[must_use]
    pub fn from_credentials(google: &ClientCredentials, github: &ClientCredentials) -> Self {
        let candidates = [
            (ProviderTemplate::google(), google),
            (ProviderTemplate::github(), github),
        ];

        let mut registrations = Vec::new();
        for (template, credentials) in candidates {
            let (id_var, secret_var) = template.credential_vars;
            let client_name = template.client_name;
            match ProviderRegistration::register(
                template,
                credentials.client_id.as_deref(),
                credentials.client_secret.as_deref(),
            ) {
                Some(registration) => {
                    info!(provider = registration.id(), "{client_name} OAuth2 client registered");
                    registrations.push(registration);
                }
                None => {
                    warn!("{client_name} OAuth2 not configured (missing {id_var} or {secret_var})");
                }
            }
        }

        let registry = Self::new(registrations);
        if !registry.has_any_provider() {
            warn!("no OAuth2 providers configured; only form login will be available");
        }
        registry
    }

    /// Returns true if the provider has a live registration.
    #[must_use]
    pub fn is_enabled(&self, provider_id: &str) -> bool {
        self.get(provider_id).is_some()
    }

    /// Returns true if at least one provider is registered.
    #[must_use]
    pub fn has_any_provider(&self) -> bool {
        !self.registrations.is_empty()
    }

    /// Looks up a registration by id.
    #[must_use]
    pub fn get(&self, provider_id: &str) -> Option<&ProviderRegistration> {
        self.registrations.iter().find(|r| r.id == provider_id)
    }

    /// Iterates registrations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ProviderRegistration> {
        self.registrations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(id: Option<&str>, secret: Option<&str>) -> ClientCredentials {
        ClientCredentials::new(id.map(str::to_string), secret.map(str::to_string))
    }

    #[test]
    fn register_requires_both_values() {
        assert!(
            ProviderRegistration::register(ProviderTemplate::google(), Some("id"), Some("s"))
                .is_some()
        );
        assert!(
            ProviderRegistration::register(ProviderTemplate::google(), Some("id"), None).is_none()
        );
        assert!(
            ProviderRegistration::register(ProviderTemplate::google(), None, Some("s")).is_none()
        );
    }

    #[test]
    fn register_treats_whitespace_as_blank() {
        assert!(
            ProviderRegistration::register(ProviderTemplate::github(), Some("id"), Some("   "))
                .is_none()
        );
        assert!(
            ProviderRegistration::register(ProviderTemplate::github(), Some("\t"), Some("s"))
                .is_none()
        );
        assert!(
            ProviderRegistration::register(ProviderTemplate::github(), Some(""), Some("")).is_none()
        );
    }

    #[test]
    fn google_registration_is_oidc() {
        let reg =
            ProviderRegistration::register(ProviderTemplate::google(), Some("gid"), Some("gsecret"))
                .expect("registered");

        assert_eq!(reg.id(), "google");
        assert_eq!(reg.kind(), ProviderKind::Oidc);
        assert_eq!(reg.user_name_attribute(), "sub");
        assert_eq!(reg.scopes(), &["openid", "profile", "email"]);
        assert_eq!(
            reg.endpoints().issuer_url.as_deref(),
            Some("https://accounts.google.com")
        );
    }

    #[test]
    fn github_registration_is_oauth2() {
        let reg =
            ProviderRegistration::register(ProviderTemplate::github(), Some("hid"), Some("hsecret"))
                .expect("registered");

        assert_eq!(reg.id(), "github");
        assert_eq!(reg.kind(), ProviderKind::OAuth2);
        assert_eq!(reg.user_name_attribute(), "id");
        assert_eq!(reg.endpoints().user_info_uri, "https://api.github.com/user");
    }

    #[test]
    fn debug_output_redacts_secret() {
        let reg = ProviderRegistration::register(
            ProviderTemplate::google(),
            Some("gid"),
            Some("super-secret-value"),
        )
        .expect("registered");

        let debug = format!("{reg:?}");
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn registry_with_no_credentials_is_empty() {
        let registry =
            ProviderRegistry::from_credentials(&ClientCredentials::default(), &creds(None, None));

        assert!(!registry.has_any_provider());
        assert!(!registry.is_enabled("google"));
        assert!(!registry.is_enabled("github"));
    }

    #[test]
    fn registry_with_one_provider() {
        let registry = ProviderRegistry::from_credentials(
            &creds(Some("gid"), Some("   ")),
            &creds(Some("hid"), Some("hsecret")),
        );

        assert!(registry.has_any_provider());
        assert!(!registry.is_enabled("google"));
        assert!(registry.is_enabled("github"));
        assert_eq!(registry.iter().count(), 1);
    }

    #[test]
    fn registry_with_both_providers() {
        let registry = ProviderRegistry::from_credentials(
            &creds(Some("gid"), Some("gsecret")),
            &creds(Some("hid"), Some("hsecret")),
        );

        assert!(registry.is_enabled("google"));
        assert!(registry.is_enabled("github"));
        assert_eq!(
            registry.iter().map(ProviderRegistration::id).collect::<Vec<_>>(),
            vec!["google", "github"]
        );
    }

    #[test]
    fn default_registry_answers_false() {
        let registry = ProviderRegistry::default();
        assert!(!registry.has_any_provider());
        assert!(!registry.is_enabled("google"));
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn client_credentials_configured_check() {
        assert!(creds(Some("a"), Some("b")).is_configured());
        assert!(!creds(Some("a"), Some(" ")).is_configured());
        assert!(!ClientCredentials::default().is_configured());
    }
}
