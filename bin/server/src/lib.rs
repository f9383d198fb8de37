//! rolebridge authentication service.
//!
//! Logs users in with a form or through an OAuth2/OIDC provider, resolves
//! their authorities through the authorization service and keeps them in a
//! server-side session.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod types;

pub use app::{build_state, router};
