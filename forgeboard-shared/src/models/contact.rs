/// Contact-form message model
///
/// Public intake: anyone may create a message; only admins read and
/// triage them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Triage state of a contact message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contact_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    New,
    InReview,
    Closed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::InReview => "in_review",
            ContactStatus::Closed => "closed",
        }
    }
}

/// Contact message row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContactMessage {
    pub id: Uuid,

    pub name: String,

    pub email: String,

    pub subject: String,

    pub body: String,

    pub status: ContactStatus,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a contact message
#[derive(Debug, Clone)]
pub struct CreateContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
}

impl ContactMessage {
    pub async fn create(
        executor: impl sqlx::PgExecutor<'_>,
        data: CreateContactMessage,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            r#"
            INSERT INTO contact_messages (name, email, subject, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, subject, body, status, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.subject)
        .bind(data.body)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            r#"
            SELECT id, name, email, subject, body, status, created_at
            FROM contact_messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn list(
        executor: impl sqlx::PgExecutor<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            r#"
            SELECT id, name, email, subject, body, status, created_at
            FROM contact_messages
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    pub async fn count(executor: impl sqlx::PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages")
            .fetch_one(executor)
            .await
    }

    pub async fn set_status(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        status: ContactStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ContactMessage>(
            r#"
            UPDATE contact_messages SET status = $2
            WHERE id = $1
            RETURNING id, name, email, subject, body, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
