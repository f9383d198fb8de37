//! Core domain types and utilities for rolebridge.
//!
//! This crate provides the types shared by the authentication side and the
//! authorization side:
//! - [`UserKey`]: the canonical `"<source>:<identifier>"` join key
//! - [`GrantedAuthorities`]: the set of role names resolved for a login
//! - the rootcause-based [`Result`] alias

pub mod authority;
pub mod error;
pub mod key;

pub use authority::GrantedAuthorities;
pub use error::Result;
pub use key::{FORM_SOURCE, ParseKeyError, UserKey, build_form_key, build_oauth_key};
