/// Comment model
///
/// Comments are immutable once created, same as time logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,

    pub task_id: Uuid,

    pub author_id: Uuid,

    pub body: String,

    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub async fn create(
        executor: impl sqlx::PgExecutor<'_>,
        task_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, author_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, task_id, author_id, body, created_at
            "#,
        )
        .bind(task_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(executor)
        .await
    }

    pub async fn list_for_task(
        executor: impl sqlx::PgExecutor<'_>,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, body, created_at
            FROM comments
            WHERE task_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(task_id)
        .fetch_all(executor)
        .await
    }
}
