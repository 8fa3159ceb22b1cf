/// Time log model
///
/// Time logs are immutable once created: there are no update or single-row
/// delete operations. Rows disappear only when their task cascades away.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time log row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeLog {
    pub id: Uuid,

    pub task_id: Uuid,

    /// User the hours are attributed to
    pub user_id: Uuid,

    /// Hours worked, positive
    pub hours: f64,

    pub note: Option<String>,

    pub logged_at: DateTime<Utc>,
}

/// Input for creating a time log
#[derive(Debug, Clone)]
pub struct CreateTimeLog {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub hours: f64,
    pub note: Option<String>,
}

impl TimeLog {
    pub async fn create(
        executor: impl sqlx::PgExecutor<'_>,
        data: CreateTimeLog,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TimeLog>(
            r#"
            INSERT INTO time_logs (task_id, user_id, hours, note)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, user_id, hours, note, logged_at
            "#,
        )
        .bind(data.task_id)
        .bind(data.user_id)
        .bind(data.hours)
        .bind(data.note)
        .fetch_one(executor)
        .await
    }

    pub async fn list_for_task(
        executor: impl sqlx::PgExecutor<'_>,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TimeLog>(
            r#"
            SELECT id, task_id, user_id, hours, note, logged_at
            FROM time_logs
            WHERE task_id = $1
            ORDER BY logged_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await
    }

    /// Total hours logged against a task
    pub async fn total_hours_for_task(
        executor: impl sqlx::PgExecutor<'_>,
        task_id: Uuid,
    ) -> Result<f64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(hours), 0)::DOUBLE PRECISION FROM time_logs WHERE task_id = $1",
        )
        .bind(task_id)
        .fetch_one(executor)
        .await
    }
}
