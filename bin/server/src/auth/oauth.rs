//! Plain OAuth2 client (no ID token) using the oauth2 crate.
//!
//! Identity comes from the provider's user-info endpoint alone.

use super::client::{AuthState, OAuthError, fetch_user_info, http_client, provider_authorities};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use rolebridge_platform_access::{IdentityAssertion, ProviderRegistration};
use rootcause::prelude::Report;
use tracing::debug;

/// OAuth2 client for one provider.
pub struct OAuthClient {
    registration: ProviderRegistration,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    http: reqwest::Client,
}

impl OAuthClient {
    /// Creates a client for a plain OAuth2 registration.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint or the redirect URI is invalid.
    pub fn new(
        registration: ProviderRegistration,
        redirect_uri: String,
    ) -> Result<Self, Report<OAuthError>> {
        let endpoints = registration.endpoints();
        let auth_url = AuthUrl::new(endpoints.authorization_uri.clone())
            .map_err(|e| OAuthError::Configuration(format!("invalid authorization URL: {e}")))?;
        let token_url = TokenUrl::new(endpoints.token_uri.clone())
            .map_err(|e| OAuthError::Configuration(format!("invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(redirect_uri)
            .map_err(|e| OAuthError::Configuration(format!("invalid redirect URI: {e}")))?;

        Ok(Self {
            registration,
            auth_url,
            token_url,
            redirect_url,
            http: http_client()?,
        })
    }

    /// Generates the authorization URL for redirecting the user.
    pub fn authorization_url(&self) -> (String, AuthState) {
        let client = BasicClient::new(ClientId::new(self.registration.client_id().to_string()))
            .set_client_secret(ClientSecret::new(
                self.registration.client_secret().to_string(),
            ))
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);

        for scope in self.registration.scopes() {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token) = auth_request.url();

        let state = AuthState {
            provider: self.registration.id().to_string(),
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: None,
        };

        (auth_url.to_string(), state)
    }

    /// Exchanges the authorization code for an access token and loads the
    /// user's attributes.
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<IdentityAssertion, Report<OAuthError>> {
        let client = BasicClient::new(ClientId::new(self.registration.client_id().to_string()))
            .set_client_secret(ClientSecret::new(
                self.registration.client_secret().to_string(),
            ))
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier.clone()))
            .request_async(&self.http)
            .await
            .map_err(|e| OAuthError::TokenExchange(format!("token exchange failed: {e}")))?;

        let attributes = fetch_user_info(
            &self.http,
            &self.registration.endpoints().user_info_uri,
            token_response.access_token().secret(),
        )
        .await?;

        let authorities = match token_response.scopes() {
            Some(granted) => provider_authorities(
                self.registration.kind(),
                granted.iter().map(|s| s.as_str()),
            ),
            None => provider_authorities(
                self.registration.kind(),
                self.registration.scopes().iter().map(String::as_str),
            ),
        };

        debug!(provider = self.registration.id(), "user attributes loaded");
        Ok(IdentityAssertion::new(self.registration.id(), attributes).with_authorities(authorities))
    }
}
