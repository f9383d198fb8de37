//! Login orchestration: from a verified login to a principal with authorities.
//!
//! Both login paths end the same way. The identity is reduced to a canonical
//! user key, the authorization service is asked for the roles stored against
//! that key, and the result becomes a [`Principal`]. Nothing here keeps state
//! between logins.

use crate::claims::{self, ClaimSet};
use crate::credentials::CredentialStore;
use crate::error::AuthenticationError;
use crate::principal::Principal;
use crate::provider::{ProviderRegistration, ProviderRegistry};
use rolebridge_authz::RoleLookup;
use rolebridge_core::{GrantedAuthorities, build_form_key, build_oauth_key};
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Stored role that triggers claim enrichment on OAuth2/OIDC logins.
pub const POWER_USER_ROLE: &str = "ROLE_POWER_USER";

/// Claim added for power users.
pub const POWER_USER_CLAIM: &str = "custom_claim";

/// Value of [`POWER_USER_CLAIM`].
pub const POWER_USER_CLAIM_VALUE: &str = "Power User Active";

/// A provider-verified identity, as produced by the OAuth2/OIDC client after
/// the code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAssertion {
    /// Registration id of the provider (e.g. "google").
    pub provider_id: String,
    /// ID-token claims (OIDC) or user attributes (OAuth2).
    pub claims: ClaimSet,
    /// Claims from the user-info endpoint, when the provider returned any.
    pub user_info: Option<ClaimSet>,
    /// Authorities granted by the provider itself.
    pub authorities: GrantedAuthorities,
}

impl IdentityAssertion {
    #[must_use]
    pub fn new(provider_id: impl Into<String>, claims: ClaimSet) -> Self {
        Self {
            provider_id: provider_id.into(),
            claims,
            user_info: None,
            authorities: GrantedAuthorities::empty(),
        }
    }

    #[must_use]
    pub fn with_user_info(mut self, user_info: Option<ClaimSet>) -> Self {
        self.user_info = user_info;
        self
    }

    #[must_use]
    pub fn with_authorities(mut self, authorities: GrantedAuthorities) -> Self {
        self.authorities = authorities;
        self
    }
}

/// Resolves logins into principals.
///
/// Holds only shared, read-only collaborators and can be cloned freely.
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<dyn CredentialStore>,
    roles: Arc<dyn RoleLookup>,
    registry: Arc<ProviderRegistry>,
}

impl Authenticator {
    /// Creates an authenticator.
    #[must_use]
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        roles: Arc<dyn RoleLookup>,
        registry: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            credentials,
            roles,
            registry,
        }
    }

    /// Returns the provider registry this authenticator was built with.
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Authenticates a form login.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` for an unknown user or a wrong password
    /// alike, and `CredentialStore` if verification itself failed.
    #[instrument(skip(self, password))]
    pub async fn authenticate_form(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Principal, Report<AuthenticationError>> {
        let store = Arc::clone(&self.credentials);
        let (user, pass) = (username.to_string(), password.to_string());
        let verified = tokio::task::spawn_blocking(move || store.verify(&user, &pass))
            .await
            .map_err(|e| AuthenticationError::CredentialStore {
                reason: format!("verification task failed: {e}"),
            })??;

        if !verified {
            debug!("form login rejected");
            return Err(AuthenticationError::InvalidCredentials.into());
        }

        let key = build_form_key(username);
        let roles = self.roles.fetch_roles(&key).await;

        info!(user_key = %key, roles = roles.len(), "form login succeeded");
        Ok(Principal::form(key, username, roles))
    }

    /// Returns the OAuth2/OIDC login path, or `None` if no provider is
    /// registered.
    ///
    /// Callers decide once, when wiring routes, whether to offer OAuth2
    /// login at all.
    #[must_use]
    pub fn oauth_login(&self) -> Option<OAuthLogin> {
        self.registry.has_any_provider().then(|| OAuthLogin {
            roles: Arc::clone(&self.roles),
            registry: Arc::clone(&self.registry),
        })
    }
}

/// The OAuth2/OIDC login path. Only exists when a provider is registered.
#[derive(Clone)]
pub struct OAuthLogin {
    roles: Arc<dyn RoleLookup>,
    registry: Arc<ProviderRegistry>,
}

impl OAuthLogin {
    /// Returns the provider registry.
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Resolves a provider-verified identity into a principal.
    ///
    /// Stored roles are added to the provider's own authorities. When the
    /// combined set holds [`POWER_USER_ROLE`], the user-info claims gain
    /// [`POWER_USER_CLAIM`]; the assertion itself is not modified.
    ///
    /// # Errors
    ///
    /// Returns `ProviderNotEnabled` for an unregistered provider and
    /// `MissingClaim` if the provider supplied neither an email nor its
    /// stable user identifier.
    #[instrument(skip(self, assertion), fields(provider = %assertion.provider_id))]
    pub async fn authenticate(
        &self,
        assertion: IdentityAssertion,
    ) -> Result<Principal, Report<AuthenticationError>> {
        let registration = self.registry.get(&assertion.provider_id).ok_or_else(|| {
            AuthenticationError::ProviderNotEnabled {
                provider: assertion.provider_id.clone(),
            }
        })?;

        let base_claims = match &assertion.user_info {
            Some(info) => assertion.claims.merged_with(info),
            None => assertion.claims.clone(),
        };
        let identifier = login_identifier(registration, &base_claims)?;

        let key = build_oauth_key(registration.id(), &identifier);
        let stored = self.roles.fetch_roles(&key).await;
        let authorities = assertion.authorities.union(&stored);

        let principal_claims = if authorities.contains(POWER_USER_ROLE) {
            let enriched = assertion
                .user_info
                .clone()
                .unwrap_or_default()
                .with_claim(POWER_USER_CLAIM, POWER_USER_CLAIM_VALUE);
            debug!(user_key = %key, "power user claim added");
            assertion.claims.merged_with(&enriched)
        } else {
            base_claims
        };

        let display_name = principal_claims
            .get_string(claims::NAME)
            .or_else(|| principal_claims.email())
            .unwrap_or_else(|| identifier.clone());

        info!(
            user_key = %key,
            stored_roles = stored.len(),
            authorities = authorities.len(),
            "OAuth2 login succeeded"
        );
        Ok(Principal::oauth(
            key,
            display_name,
            authorities,
            principal_claims,
        ))
    }
}

/// Picks the identifier for the canonical key: the email when present and
/// not marked unverified, otherwise the provider's stable user-name
/// attribute.
fn login_identifier(
    registration: &ProviderRegistration,
    merged: &ClaimSet,
) -> Result<String, Report<AuthenticationError>> {
    if let Some(email) = merged.email() {
        if merged.email_verified() != Some(false) {
            return Ok(email);
        }
        debug!("provider marked the email unverified; keying on stable identifier");
    }

    let attribute = registration.user_name_attribute();
    match merged.get_string(attribute) {
        Some(subject) => {
            debug!(
                attribute,
                "provider supplied no email; keying on stable identifier"
            );
            Ok(subject)
        }
        None => Err(AuthenticationError::MissingClaim {
            claim: claims::EMAIL.to_string(),
        }
        .into()),
    }
}
