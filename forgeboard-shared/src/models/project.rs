/// Project model and database operations
///
/// A project is owned by exactly one client user and carries zero or more
/// non-owner members with a project-scoped role label. Deleting a project
/// is blocked while it still has tasks; when it has none, its members,
/// comments, and activity rows are removed inside one transaction before
/// the project row itself.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('pending', 'in_progress', 'review', 'completed', 'cancelled');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     status project_status NOT NULL DEFAULT 'pending',
///     budget DOUBLE PRECISION,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     member_role VARCHAR(100) NOT NULL DEFAULT 'member',
///     added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    InProgress,
    Review,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Review => "review",
            ProjectStatus::Cancelled => "cancelled",
            ProjectStatus::Completed => "completed",
        }
    }

    /// Completed and cancelled projects no longer accept updates
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Cancelled)
    }
}

/// Project row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,

    /// Owning client user
    pub owner_id: Uuid,

    pub name: String,

    pub description: Option<String>,

    pub status: ProjectStatus,

    /// Optional budget; summed into revenue reports once completed
    pub budget: Option<f64>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Project member row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectMember {
    pub project_id: Uuid,

    pub user_id: Uuid,

    /// Project-scoped role label (free-form, e.g. "lead", "frontend")
    pub member_role: String,

    pub added_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub budget: Option<f64>,
}

/// Input for updating a project; only provided fields change
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget: Option<f64>,
}

const PROJECT_COLUMNS: &str =
    "id, owner_id, name, description, status, budget, created_at, updated_at";

impl Project {
    pub async fn create(
        executor: impl sqlx::PgExecutor<'_>,
        data: CreateProject,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (owner_id, name, description, budget)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(data.owner_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.budget)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Lists every project (admin / view-all callers)
    pub async fn list_all(
        executor: impl sqlx::PgExecutor<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS} FROM projects
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    /// Lists projects the user owns or is a member of
    pub async fn list_visible_to(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS} FROM projects p
            WHERE p.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM project_members m
                   WHERE m.project_id = p.id AND m.user_id = $1
               )
            ORDER BY p.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    pub async fn count_all(executor: impl sqlx::PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(executor)
            .await
    }

    pub async fn count_visible_to(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM projects p
            WHERE p.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM project_members m
                   WHERE m.project_id = p.id AND m.user_id = $1
               )
            "#,
        )
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    pub async fn update(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                budget = COALESCE($5, budget),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.status)
        .bind(data.budget)
        .fetch_optional(executor)
        .await
    }

    /// Counts tasks belonging to this project
    ///
    /// Deletion is rejected with a conflict while this is non-zero.
    pub async fn task_count(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE project_id = $1")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Removes dependent members and activity rows, then the project
    ///
    /// Must run after the caller has verified `task_count` is zero; the
    /// whole sequence is one transaction so a failure leaves no partial
    /// state.
    pub async fn delete_cascade(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM activity_logs WHERE target_id = $1 AND target_type = 'project'")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl ProjectMember {
    pub async fn add(
        executor: impl sqlx::PgExecutor<'_>,
        project_id: Uuid,
        user_id: Uuid,
        member_role: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, member_role)
            VALUES ($1, $2, $3)
            RETURNING project_id, user_id, member_role, added_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(member_role)
        .fetch_one(executor)
        .await
    }

    pub async fn remove(
        executor: impl sqlx::PgExecutor<'_>,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_project(
        executor: impl sqlx::PgExecutor<'_>,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, member_role, added_at
            FROM project_members
            WHERE project_id = $1
            ORDER BY added_at
            "#,
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }

    /// Whether the user is a member (not owner) of the project
    pub async fn is_member(
        executor: impl sqlx::PgExecutor<'_>,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM project_members WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(ProjectStatus::Completed.is_terminal());
        assert!(ProjectStatus::Cancelled.is_terminal());
        assert!(!ProjectStatus::Pending.is_terminal());
        assert!(!ProjectStatus::InProgress.is_terminal());
        assert!(!ProjectStatus::Review.is_terminal());
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(ProjectStatus::InProgress.as_str(), "in_progress");
        assert_eq!(ProjectStatus::Cancelled.as_str(), "cancelled");
    }
}
