/// Task model and database operations
///
/// Tasks belong to exactly one project. An assignee, if set, must be a
/// member of that project or an admin-level user; that invariant is
/// enforced by the assignment handler, not the database.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'review', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE RESTRICT,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task workflow status
///
/// All four states are mutable in any direction; `done` is not terminal
/// (tasks get reopened).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    pub project_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    /// Assigned user (None = unassigned)
    pub assignee_id: Option<Uuid>,

    /// User who created the task
    pub created_by: Uuid,

    pub due_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub created_by: Uuid,
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for updating a task; only provided fields change
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

const TASK_COLUMNS: &str = "id, project_id, title, description, status, priority, assignee_id, \
     created_by, due_date, created_at, updated_at";

impl Task {
    pub async fn create(
        executor: impl sqlx::PgExecutor<'_>,
        data: CreateTask,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (project_id, title, description, priority, created_by, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.priority)
        .bind(data.created_by)
        .bind(data.due_date)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists tasks in a project, newest first
    pub async fn list_for_project(
        executor: impl sqlx::PgExecutor<'_>,
        project_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE project_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(project_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    pub async fn count_for_project(
        executor: impl sqlx::PgExecutor<'_>,
        project_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(executor)
            .await
    }

    /// Lists tasks assigned to a user (developer dashboard)
    pub async fn list_assigned_to(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE assignee_id = $1
            ORDER BY
                CASE priority
                    WHEN 'urgent' THEN 0
                    WHEN 'high' THEN 1
                    WHEN 'medium' THEN 2
                    ELSE 3
                END,
                due_date NULLS LAST
            LIMIT $2 OFFSET $3
            "#,
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    pub async fn count_assigned_to(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE assignee_id = $1")
            .bind(user_id)
            .fetch_one(executor)
            .await
    }

    pub async fn update(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                due_date = COALESCE($6, due_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.due_date)
        .fetch_optional(executor)
        .await
    }

    /// Sets or clears the assignee
    pub async fn set_assignee(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        assignee_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks SET assignee_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(assignee_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn set_status(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a task; time logs and comments cascade at the database level
    pub async fn delete(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Todo.as_str(), "todo");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Review.as_str(), "review");
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(TaskPriority::Urgent.as_str(), "urgent");
        assert_eq!(TaskPriority::Low.as_str(), "low");
    }
}
