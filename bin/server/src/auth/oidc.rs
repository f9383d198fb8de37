//! OIDC client implementation using the openidconnect crate.

use super::client::{AuthState, OAuthError, fetch_user_info, http_client, provider_authorities};
use base64::Engine;
use openidconnect::core::{CoreAuthenticationFlow, CoreClient, CoreProviderMetadata};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, OAuth2TokenResponse,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse,
};
use rolebridge_platform_access::{ClaimSet, IdentityAssertion, ProviderRegistration};
use rootcause::prelude::Report;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// OIDC client for one provider.
///
/// Provider metadata is discovered on first use and cached, so startup does
/// not depend on the provider being reachable.
pub struct OidcClient {
    registration: ProviderRegistration,
    issuer_url: IssuerUrl,
    redirect_url: RedirectUrl,
    http: reqwest::Client,
    provider_metadata: OnceCell<CoreProviderMetadata>,
}

impl OidcClient {
    /// Creates a client for an OIDC registration.
    ///
    /// # Errors
    ///
    /// Returns an error if the issuer or redirect URI is invalid.
    pub fn new(
        registration: ProviderRegistration,
        redirect_uri: String,
    ) -> Result<Self, Report<OAuthError>> {
        let issuer = registration.endpoints().issuer_url.clone().ok_or_else(|| {
            OAuthError::Configuration(format!("provider '{}' has no issuer", registration.id()))
        })?;
        let issuer_url = IssuerUrl::new(issuer)
            .map_err(|e| OAuthError::Configuration(format!("invalid issuer URL: {e}")))?;
        let redirect_url = RedirectUrl::new(redirect_uri)
            .map_err(|e| OAuthError::Configuration(format!("invalid redirect URI: {e}")))?;

        Ok(Self {
            registration,
            issuer_url,
            redirect_url,
            http: http_client()?,
            provider_metadata: OnceCell::new(),
        })
    }

    async fn provider_metadata(&self) -> Result<&CoreProviderMetadata, Report<OAuthError>> {
        self.provider_metadata
            .get_or_try_init(|| async {
                info!(provider = self.registration.id(), "discovering OIDC provider");
                CoreProviderMetadata::discover_async(self.issuer_url.clone(), &self.http)
                    .await
                    .map_err(|e| {
                        OAuthError::Discovery(format!("failed to discover provider: {e}")).into()
                    })
            })
            .await
    }

    /// Generates the authorization URL for redirecting the user.
    pub async fn authorization_url(&self) -> Result<(String, AuthState), Report<OAuthError>> {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata().await?.clone(),
            ClientId::new(self.registration.client_id().to_string()),
            Some(ClientSecret::new(
                self.registration.client_secret().to_string(),
            )),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        // "openid" is added by the library.
        for scope in self.registration.scopes().iter().filter(|s| *s != "openid") {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let state = AuthState {
            provider: self.registration.id().to_string(),
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: Some(nonce.secret().clone()),
        };

        Ok((auth_url.to_string(), state))
    }

    /// Exchanges the authorization code for tokens, verifies the ID token
    /// and loads user info.
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<IdentityAssertion, Report<OAuthError>> {
        let client = CoreClient::from_provider_metadata(
            self.provider_metadata().await?.clone(),
            ClientId::new(self.registration.client_id().to_string()),
            Some(ClientSecret::new(
                self.registration.client_secret().to_string(),
            )),
        )
        .set_redirect_uri(self.redirect_url.clone());

        let nonce = state
            .nonce
            .clone()
            .map(Nonce::new)
            .ok_or_else(|| OAuthError::TokenValidation("no nonce in auth state".to_string()))?;

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| OAuthError::TokenExchange(format!("token endpoint error: {e}")))?
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier.clone()))
            .request_async(&self.http)
            .await
            .map_err(|e| OAuthError::TokenExchange(format!("token exchange failed: {e}")))?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| OAuthError::TokenExchange("no ID token in response".to_string()))?;

        // Verifies signature, issuer, audience, expiry and nonce.
        let verified = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| {
                OAuthError::TokenValidation(format!("ID token validation failed: {e}"))
            })?;
        let subject = verified.subject().as_str().to_string();

        // The verified claims type only exposes standard claims; the full set
        // is read from the same token's payload.
        let claims = id_token_payload(&token_response)?;

        let user_info = match fetch_user_info(
            &self.http,
            &self.registration.endpoints().user_info_uri,
            token_response.access_token().secret(),
        )
        .await
        {
            Ok(info) if info.get_string("sub").as_deref() == Some(subject.as_str()) => Some(info),
            Ok(_) => {
                return Err(OAuthError::TokenValidation(
                    "user info subject does not match ID token".to_string(),
                )
                .into());
            }
            Err(e) => {
                warn!(provider = self.registration.id(), error = %e, "user info unavailable; using ID token claims only");
                None
            }
        };

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

        debug!(provider = self.registration.id(), "ID token verified");
        Ok(IdentityAssertion::new(self.registration.id(), claims)
            .with_user_info(user_info)
            .with_authorities(authorities))
    }
}

/// Reads every claim from the ID token in a token response.
fn id_token_payload<TR>(token_response: &TR) -> Result<ClaimSet, Report<OAuthError>>
where
    TR: serde::Serialize,
{
    // The token response includes the raw id_token string.
    let response_json = serde_json::to_value(token_response).map_err(|e| {
        OAuthError::TokenValidation(format!("failed to serialize token response: {e}"))
    })?;

    let id_token = response_json
        .get("id_token")
        .and_then(|v| v.as_str())
        .ok_or_else(|| OAuthError::TokenValidation("no id_token in response".to_string()))?;

    decode_jwt_payload(id_token)
}

/// Decodes the payload of a compact JWT without checking the signature.
fn decode_jwt_payload(jwt: &str) -> Result<ClaimSet, Report<OAuthError>> {
    // JWT is base64url(header).base64url(payload).signature
    let parts: Vec<&str> = jwt.split('.').collect();
    if parts.len() != 3 {
        return Err(OAuthError::TokenValidation("invalid JWT format".to_string()).into());
    }

    let payload_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| OAuthError::TokenValidation(format!("failed to decode JWT payload: {e}")))?;

    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes)
        .map_err(|e| OAuthError::TokenValidation(format!("failed to parse JWT payload: {e}")))?;

    ClaimSet::from_json(payload)
        .ok_or_else(|| OAuthError::TokenValidation("JWT payload is not an object".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolebridge_platform_access::{ClientCredentials, ProviderRegistry};
    use serde_json::json;

    fn encode(value: &serde_json::Value) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(value.to_string())
    }

    #[test]
    fn decodes_jwt_payload() {
        let jwt = format!(
            "{}.{}.sig",
            encode(&json!({"alg": "RS256"})),
            encode(&json!({"sub": "123", "email": "u@example.com", "email_verified": true}))
        );

        let claims = decode_jwt_payload(&jwt).expect("payload");

        assert_eq!(claims.get_string("sub").as_deref(), Some("123"));
        assert_eq!(claims.email().as_deref(), Some("u@example.com"));
        assert_eq!(claims.get("email_verified"), Some(&json!(true)));
    }

    #[test]
    fn rejects_malformed_jwt() {
        assert!(decode_jwt_payload("only.two").is_err());
        assert!(decode_jwt_payload("a.!!!.c").is_err());
        let not_object = format!("{}.{}.sig", encode(&json!({})), encode(&json!([1, 2])));
        assert!(decode_jwt_payload(&not_object).is_err());
    }

    #[test]
    fn new_requires_valid_redirect_uri() {
        let registry = ProviderRegistry::from_credentials(
            &ClientCredentials::new(Some("gid".into()), Some("gsecret".into())),
            &ClientCredentials::default(),
        );
        let registration = registry.get("google").expect("google").clone();

        assert!(OidcClient::new(registration.clone(), "not a url".to_string()).is_err());
        assert!(
            OidcClient::new(
                registration,
                "http://localhost:8080/login/oauth2/code/google".to_string()
            )
            .is_ok()
        );
    }
}
