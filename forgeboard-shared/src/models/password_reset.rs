/// Password reset token model
///
/// Reset tokens are stored only as SHA-256 hashes, never plaintext. A token
/// is single-use and time-boxed: consumption marks it used, and completing
/// a reset invalidates every other outstanding token for that user, all
/// inside the transaction that also updates the password hash.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE password_resets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_hash VARCHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     used_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Password reset row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasswordReset {
    pub id: Uuid,

    pub user_id: Uuid,

    /// SHA-256 hex of the token; the plaintext exists only in the email
    pub token_hash: String,

    pub expires_at: DateTime<Utc>,

    /// When the token was consumed (None while live)
    pub used_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    /// Whether the token can still be consumed
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }

    /// Stores a new reset token hash with the given time-to-live
    pub async fn create(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
        token_hash: &str,
        ttl: Duration,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PasswordReset>(
            r#"
            INSERT INTO password_resets (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, used_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(Utc::now() + ttl)
        .fetch_one(executor)
        .await
    }

    /// Looks up a token by its hash
    pub async fn find_by_token_hash(
        executor: impl sqlx::PgExecutor<'_>,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PasswordReset>(
            r#"
            SELECT id, user_id, token_hash, expires_at, used_at, created_at
            FROM password_resets
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(executor)
        .await
    }

    /// Marks a token used, guarding against double consumption
    ///
    /// Compare-and-set on `used_at IS NULL`; returns false when the token
    /// was already consumed.
    pub async fn mark_used(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE password_resets SET used_at = NOW() WHERE id = $1 AND used_at IS NULL")
                .bind(id)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Invalidates every other live token for the user
    ///
    /// Called inside the reset transaction so a completed reset leaves no
    /// redeemable siblings behind.
    pub async fn invalidate_others(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
        except_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE password_resets SET used_at = NOW()
            WHERE user_id = $1 AND id <> $2 AND used_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(except_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Counts tokens issued to a user within the recent window
    ///
    /// Backs the per-user issuance cap on forgot-password requests.
    pub async fn recent_request_count(
        executor: impl sqlx::PgExecutor<'_>,
        user_id: Uuid,
        window: Duration,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM password_resets WHERE user_id = $1 AND created_at > $2",
        )
        .bind(user_id)
        .bind(Utc::now() - window)
        .fetch_one(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(used: bool, expires_in: Duration) -> PasswordReset {
        PasswordReset {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "a".repeat(64),
            expires_at: Utc::now() + expires_in,
            used_at: used.then(Utc::now),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_live_token_is_valid() {
        assert!(sample(false, Duration::minutes(30)).is_valid(Utc::now()));
    }

    #[test]
    fn test_used_token_is_invalid() {
        assert!(!sample(true, Duration::minutes(30)).is_valid(Utc::now()));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        assert!(!sample(false, Duration::minutes(-1)).is_valid(Utc::now()));
    }
}
