/// Notification model
///
/// Per-user inbox entries with read/unread state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,

    /// Recipient
    pub user_id: Uuid,

    pub title: String,

    pub body: String,

    pub is_read: bool,

    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub async fn create(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
        title: &str,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, title, body)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, body, is_read, created_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(body)
        .fetch_one(executor)
        .await
    }

    /// Lists a user's notifications, newest first
    pub async fn list_for_user(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, title, body, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    pub async fn count_for_user(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(executor)
            .await
    }

    pub async fn unread_count(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Marks one notification read; scoped to the owner so a user cannot
    /// touch someone else's inbox
    pub async fn mark_read(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks all of a user's notifications read, returning how many changed
    pub async fn mark_all_read(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
