//! Role assignment storage.

use crate::domain::{Role, RoleAssignment};
use crate::error::RepositoryError;
use async_trait::async_trait;
use rootcause::prelude::Report;
use sqlx::{FromRow, PgPool};

/// Role name granted to the default form user by the seed data.
pub const DEFAULT_ADMIN_ROLE: &str = "ROLE_ADMIN";

/// User key of the default form user.
pub const DEFAULT_ADMIN_KEY: &str = "form:admin";

/// Read access to role assignments.
#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    /// Returns every assignment whose user identifier equals
    /// `user_identifier` exactly.
    async fn find_by_user_identifier(
        &self,
        user_identifier: &str,
    ) -> Result<Vec<RoleAssignment>, Report<RepositoryError>>;
}

/// Fixed set of assignments held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoleAssignmentRepository {
    assignments: Vec<RoleAssignment>,
}

impl InMemoryRoleAssignmentRepository {
    #[must_use]
    pub fn new(assignments: Vec<RoleAssignment>) -> Self {
        Self { assignments }
    }

    /// The same data the database migration seeds: `form:admin` holds
    /// `ROLE_ADMIN`.
    #[must_use]
    pub fn seeded() -> Self {
        Self::default().with_assignment(DEFAULT_ADMIN_KEY, DEFAULT_ADMIN_ROLE)
    }

    /// Adds an assignment, reusing the role id if the role already exists.
    #[must_use]
    pub fn with_assignment(mut self, user_identifier: &str, role_name: &str) -> Self {
        let role = self
            .assignments
            .iter()
            .map(|a| &a.role)
            .find(|r| r.name == role_name)
            .cloned()
            .unwrap_or_else(|| {
                let next = self.assignments.iter().map(|a| a.role.id).max().unwrap_or(0) + 1;
                Role::new(next, role_name)
            });
        let id = self.assignments.len() as i64 + 1;
        self.assignments
            .push(RoleAssignment::new(id, user_identifier, role));
        self
    }
}

#[async_trait]
impl RoleAssignmentRepository for InMemoryRoleAssignmentRepository {
    async fn find_by_user_identifier(
        &self,
        user_identifier: &str,
    ) -> Result<Vec<RoleAssignment>, Report<RepositoryError>> {
        Ok(self
            .assignments
            .iter()
            .filter(|a| a.user_identifier == user_identifier)
            .cloned()
            .collect())
    }
}

#[derive(FromRow)]
struct AssignmentRow {
    id: i64,
    user_identifier: String,
    role_id: i64,
    role_name: String,
}

impl From<AssignmentRow> for RoleAssignment {
    fn from(row: AssignmentRow) -> Self {
        RoleAssignment::new(row.id, row.user_identifier, Role::new(row.role_id, row.role_name))
    }
}

/// PostgreSQL-backed repository.
pub struct PgRoleAssignmentRepository {
    pool: PgPool,
}

impl PgRoleAssignmentRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleAssignmentRepository for PgRoleAssignmentRepository {
    async fn find_by_user_identifier(
        &self,
        user_identifier: &str,
    ) -> Result<Vec<RoleAssignment>, Report<RepositoryError>> {
        let rows: Vec<AssignmentRow> = sqlx::query_as(
            r#"
            SELECT ra.id, ra.user_identifier, r.id AS role_id, r.name AS role_name
            FROM role_assignments ra
            JOIN roles r ON r.id = ra.role_id
            WHERE ra.user_identifier = $1
            ORDER BY ra.id
            "#,
        )
        .bind(user_identifier)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database {
            details: e.to_string(),
        })?;

        Ok(rows.into_iter().map(RoleAssignment::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_repository_has_default_admin() {
        let repo = InMemoryRoleAssignmentRepository::seeded();

        let found = repo
            .find_by_user_identifier("form:admin")
            .await
            .expect("lookup");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].role.name, "ROLE_ADMIN");
    }

    #[tokio::test]
    async fn lookup_is_exact_match() {
        let repo = InMemoryRoleAssignmentRepository::seeded();

        for key in ["form:Admin", "form:admin ", "admin", "google:admin"] {
            let found = repo.find_by_user_identifier(key).await.expect("lookup");
            assert!(found.is_empty(), "{key} should not match");
        }
    }

    #[test]
    fn with_assignment_reuses_role_ids() {
        let repo = InMemoryRoleAssignmentRepository::seeded()
            .with_assignment("google:a@example.com", "ROLE_ADMIN")
            .with_assignment("google:a@example.com", "ROLE_POWER_USER");

        let admin_ids: Vec<i64> = repo
            .assignments
            .iter()
            .filter(|a| a.role.name == "ROLE_ADMIN")
            .map(|a| a.role.id)
            .collect();
        assert_eq!(admin_ids, vec![1, 1]);
        assert_eq!(repo.assignments[2].role.id, 2);
        assert_eq!(repo.assignments[2].id, 3);
    }
}
