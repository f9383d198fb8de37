//! Role resolution over the assignment repository.

use crate::error::RepositoryError;
use crate::repository::RoleAssignmentRepository;
use rolebridge_core::GrantedAuthorities;
use rootcause::prelude::Report;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Answers "which roles does this user key hold?".
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn RoleAssignmentRepository>,
}

impl AuthorizationService {
    #[must_use]
    pub fn new(repository: Arc<dyn RoleAssignmentRepository>) -> Self {
        Self { repository }
    }

    /// Returns the distinct role names assigned to `user_identifier`.
    ///
    /// An unknown identifier yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be read.
    #[instrument(skip(self))]
    pub async fn roles_for_user(
        &self,
        user_identifier: &str,
    ) -> Result<GrantedAuthorities, Report<RepositoryError>> {
        let assignments = self
            .repository
            .find_by_user_identifier(user_identifier)
            .await?;

        let roles: GrantedAuthorities = assignments.into_iter().map(|a| a.role.name).collect();
        debug!(count = roles.len(), "resolved roles");
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRoleAssignmentRepository;

    #[tokio::test]
    async fn duplicate_assignments_collapse() {
        let repo = InMemoryRoleAssignmentRepository::default()
            .with_assignment("github:dev@example.com", "ROLE_USER")
            .with_assignment("github:dev@example.com", "ROLE_USER")
            .with_assignment("github:dev@example.com", "ROLE_POWER_USER");
        let service = AuthorizationService::new(Arc::new(repo));

        let roles = service
            .roles_for_user("github:dev@example.com")
            .await
            .expect("roles");

        assert_eq!(
            roles.iter().collect::<Vec<_>>(),
            vec!["ROLE_POWER_USER", "ROLE_USER"]
        );
    }

    #[tokio::test]
    async fn unknown_user_has_no_roles() {
        let service =
            AuthorizationService::new(Arc::new(InMemoryRoleAssignmentRepository::seeded()));

        let roles = service.roles_for_user("form:ghost").await.expect("roles");

        assert!(roles.is_empty());
    }
}
