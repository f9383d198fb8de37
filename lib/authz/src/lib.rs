//! Authorization service client for rolebridge.
//!
//! The authentication side never reads role assignments directly. It asks
//! the authorization service for the roles of a [`UserKey`] over HTTP and
//! treats every failure as "no roles" (fail-closed).
//!
//! [`UserKey`]: rolebridge_core::UserKey

mod client;
mod error;
mod types;

pub use client::{AuthzClient, DEFAULT_TIMEOUT, RoleLookup};
pub use error::AuthzError;
pub use types::{HealthResponse, RolesResponse, SERVICE_NAME};
