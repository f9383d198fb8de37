//! Provider clients: the library-driven half of an OAuth2/OIDC login.
//!
//! A client builds the authorization redirect and, on callback, performs the
//! code exchange and hands back a provider-verified [`IdentityAssertion`].
//! The OAuth2 protocol itself is left to the `oauth2` and `openidconnect`
//! crates.

use super::oauth::OAuthClient;
use super::oidc::OidcClient;
use rolebridge_core::GrantedAuthorities;
use rolebridge_platform_access::{
    ClaimSet, IdentityAssertion, ProviderKind, ProviderRegistration, ProviderRegistry,
};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// User agent sent to provider APIs (GitHub rejects requests without one).
const USER_AGENT: &str = concat!("rolebridge/", env!("CARGO_PKG_VERSION"));

/// Data needed to complete a login on callback.
///
/// Stored in a short-lived HTTP-only cookie between the redirect and the
/// callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub provider: String,
    pub csrf_token: String,
    pub pkce_verifier: String,
    /// OIDC only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// A client for one registered provider.
pub enum ProviderClient {
    Oidc(OidcClient),
    OAuth(OAuthClient),
}

impl ProviderClient {
    /// Creates the client matching the registration's kind.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint or the redirect URI is invalid.
    pub fn new(
        registration: ProviderRegistration,
        redirect_uri: String,
    ) -> Result<Self, Report<OAuthError>> {
        Ok(match registration.kind() {
            ProviderKind::Oidc => Self::Oidc(OidcClient::new(registration, redirect_uri)?),
            ProviderKind::OAuth2 => Self::OAuth(OAuthClient::new(registration, redirect_uri)?),
        })
    }

    /// Returns the provider URL to send the browser to, and the state to
    /// keep until the callback.
    ///
    /// # Errors
    ///
    /// Returns an error if OIDC discovery fails.
    pub async fn authorization_url(&self) -> Result<(String, AuthState), Report<OAuthError>> {
        match self {
            Self::Oidc(client) => client.authorization_url().await,
            Self::OAuth(client) => Ok(client.authorization_url()),
        }
    }

    /// Exchanges the authorization code and returns the verified identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange, token validation or user-info
    /// request fails.
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<IdentityAssertion, Report<OAuthError>> {
        match self {
            Self::Oidc(client) => client.exchange_code(code, state).await,
            Self::OAuth(client) => client.exchange_code(code, state).await,
        }
    }
}

/// Clients for every registered provider, keyed by registration id.
#[derive(Default)]
pub struct ProviderClients {
    clients: HashMap<String, ProviderClient>,
}

impl ProviderClients {
    /// Builds one client per registration.
    ///
    /// # Errors
    ///
    /// Returns an error if any registration yields an invalid client.
    pub fn from_registry(
        registry: &ProviderRegistry,
        redirect_uri: impl Fn(&str) -> String,
    ) -> Result<Self, Report<OAuthError>> {
        let mut clients = HashMap::new();
        for registration in registry.iter() {
            let id = registration.id().to_string();
            let client = ProviderClient::new(registration.clone(), redirect_uri(&id))?;
            clients.insert(id, client);
        }
        Ok(Self { clients })
    }

    pub fn get(&self, provider_id: &str) -> Option<&ProviderClient> {
        self.clients.get(provider_id)
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Builds the HTTP client used for provider calls.
///
/// Redirects are not followed, as the OAuth2 crates require.
pub(super) fn http_client() -> Result<reqwest::Client, Report<OAuthError>> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| {
            OAuthError::Configuration(format!("failed to create HTTP client: {e}")).into()
        })
}

/// Fetches the user-info document with the access token.
pub(super) async fn fetch_user_info(
    http: &reqwest::Client,
    user_info_uri: &str,
    access_token: &str,
) -> Result<ClaimSet, Report<OAuthError>> {
    let response = http
        .get(user_info_uri)
        .bearer_auth(access_token)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| OAuthError::UserInfo(format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(OAuthError::UserInfo(format!("unexpected status {status}")).into());
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| OAuthError::UserInfo(format!("undecodable body: {e}")))?;

    ClaimSet::from_json(body)
        .ok_or_else(|| OAuthError::UserInfo("body is not a JSON object".to_string()).into())
}

/// Authorities granted by the provider: the kind's base authority plus
/// `SCOPE_<scope>` per granted scope.
///
/// Scopes may arrive comma-separated (GitHub) or one per entry.
pub(super) fn provider_authorities<'a>(
    kind: ProviderKind,
    scopes: impl IntoIterator<Item = &'a str>,
) -> GrantedAuthorities {
    let mut authorities = GrantedAuthorities::empty();
    authorities.insert(kind.base_authority());
    for scope in scopes
        .into_iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        authorities.insert(format!("SCOPE_{scope}"));
    }
    authorities
}

/// OAuth2/OIDC client errors.
#[derive(Debug)]
pub enum OAuthError {
    /// Configuration error (invalid URLs, etc.)
    Configuration(String),
    /// Failed to discover provider metadata.
    Discovery(String),
    /// Token exchange failed.
    TokenExchange(String),
    /// Token validation failed.
    TokenValidation(String),
    /// The user-info request failed.
    UserInfo(String),
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OAuth2 configuration error: {msg}"),
            Self::Discovery(msg) => write!(f, "OIDC discovery error: {msg}"),
            Self::TokenExchange(msg) => write!(f, "OAuth2 token exchange error: {msg}"),
            Self::TokenValidation(msg) => write!(f, "OIDC token validation error: {msg}"),
            Self::UserInfo(msg) => write!(f, "user info error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rolebridge_platform_access::ClientCredentials;

    #[test]
    fn oidc_authorities_include_scopes() {
        let authorities =
            provider_authorities(ProviderKind::Oidc, ["openid", "profile", "email"]);

        assert_eq!(
            authorities.iter().collect::<Vec<_>>(),
            vec!["OIDC_USER", "SCOPE_email", "SCOPE_openid", "SCOPE_profile"]
        );
    }

    #[test]
    fn comma_separated_scopes_are_split() {
        let authorities = provider_authorities(ProviderKind::OAuth2, ["read:user,user:email"]);

        assert!(authorities.contains("OAUTH2_USER"));
        assert!(authorities.contains("SCOPE_read:user"));
        assert!(authorities.contains("SCOPE_user:email"));
        assert_eq!(authorities.len(), 3);
    }

    #[test]
    fn clients_built_per_registration() {
        let registry = ProviderRegistry::from_credentials(
            &ClientCredentials::new(Some("gid".into()), Some("gsecret".into())),
            &ClientCredentials::new(Some("hid".into()), Some("hsecret".into())),
        );

        let clients = ProviderClients::from_registry(&registry, |id| {
            format!("http://localhost:8080/login/oauth2/code/{id}")
        })
        .expect("clients");

        assert!(matches!(clients.get("google"), Some(ProviderClient::Oidc(_))));
        assert!(matches!(clients.get("github"), Some(ProviderClient::OAuth(_))));
        assert!(clients.get("gitlab").is_none());
    }

    #[test]
    fn empty_registry_builds_no_clients() {
        let clients = ProviderClients::from_registry(&ProviderRegistry::default(), |id| {
            id.to_string()
        })
        .expect("clients");
        assert!(clients.is_empty());
    }

    #[test]
    fn invalid_redirect_uri_is_rejected() {
        let registry = ProviderRegistry::from_credentials(
            &ClientCredentials::default(),
            &ClientCredentials::new(Some("hid".into()), Some("hsecret".into())),
        );

        let result = ProviderClients::from_registry(&registry, |_| "not a url".to_string());

        assert!(result.is_err());
    }
}
