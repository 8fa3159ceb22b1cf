/// System settings model
///
/// A flat key → JSON value store for system configuration that admins can
/// change at runtime (as opposed to the process configuration loaded from
/// the environment at startup).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Setting row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Setting {
    pub key: String,

    pub value: JsonValue,

    pub updated_at: DateTime<Utc>,
}

impl Setting {
    pub async fn get(
        executor: impl sqlx::PgExecutor<'_>,
        key: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(executor)
            .await
    }

    pub async fn list(executor: impl sqlx::PgExecutor<'_>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings ORDER BY key")
            .fetch_all(executor)
            .await
    }

    /// Upserts a setting value
    pub async fn put(
        executor: impl sqlx::PgExecutor<'_>,
        key: &str,
        value: JsonValue,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Setting>(
            r#"
            INSERT INTO settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING key, value, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(executor)
        .await
    }
}
