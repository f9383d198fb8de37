//! The rolebridge authorization service.
//!
//! Owns the role assignment data and answers role lookups for canonical user
//! keys over HTTP. Nothing else reads or writes the assignments.

pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod routes;
pub mod service;

pub use config::ServiceConfig;
pub use domain::{Role, RoleAssignment};
pub use error::{ApiError, RepositoryError};
pub use repository::{
    InMemoryRoleAssignmentRepository, PgRoleAssignmentRepository, RoleAssignmentRepository,
};
pub use routes::router;
pub use service::AuthorizationService;
