//! Authentication and authority resolution for rolebridge.
//!
//! This crate provides:
//! - The OAuth2/OIDC provider registry (`ProviderRegistry`), built once from
//!   client credentials
//! - Form-login credential verification (`CredentialStore`)
//! - The login orchestrator (`Authenticator`, `OAuthLogin`) that turns a
//!   verified login into a `Principal` with its granted authorities
//! - Session types (`Session`, `SessionId`)
//!
//! # Authority Model
//!
//! Every login is reduced to a canonical user key (`form:admin`,
//! `google:user@example.com`). The roles stored against that key by the
//! authorization service are added to whatever the login method itself
//! grants. A failed lookup adds nothing.
//!
//! # Example
//!
//! ```
//! use rolebridge_platform_access::{ClientCredentials, ProviderRegistry};
//!
//! let google = ClientCredentials::new(Some("id".into()), Some("secret".into()));
//! let github = ClientCredentials::default();
//!
//! let registry = ProviderRegistry::from_credentials(&google, &github);
//!
//! assert!(registry.is_enabled("google"));
//! assert!(!registry.is_enabled("github"));
//! assert!(registry.has_any_provider());
//! ```

pub mod authenticator;
pub mod claims;
pub mod credentials;
pub mod error;
pub mod principal;
pub mod provider;
pub mod session;

// Re-export main types at crate root
pub use authenticator::{
    Authenticator, IdentityAssertion, OAuthLogin, POWER_USER_CLAIM, POWER_USER_CLAIM_VALUE,
    POWER_USER_ROLE,
};
pub use claims::ClaimSet;
pub use credentials::{CredentialStore, FormUser, InMemoryCredentialStore};
pub use error::AuthenticationError;
pub use principal::Principal;
pub use provider::{
    ClientCredentials, ProviderEndpoints, ProviderKind, ProviderRegistration, ProviderRegistry,
    ProviderTemplate,
};
pub use session::{Session, SessionId};
