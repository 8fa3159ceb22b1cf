/// Invite code model and database operations
///
/// An invite code binds a role to a future signup. It is redeemable at most
/// once, only for its bound role, and only before its optional expiry.
/// Redemption is marked in the same transaction that inserts the new user,
/// so the used-state and the account are consistent even under concurrent
/// signups with the same code.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invite_codes (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     code VARCHAR(64) NOT NULL UNIQUE,
///     role user_role NOT NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     used_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     used_at TIMESTAMPTZ,
///     expires_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRole;

/// Length of the random part of an invite code
const CODE_RANDOM_LENGTH: usize = 20;

/// Invite code prefix
const CODE_PREFIX: &str = "fb_";

/// Invite code row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InviteCode {
    pub id: Uuid,

    /// The code itself, handed out out-of-band
    pub code: String,

    /// Role the code is bound to; signup must request exactly this role
    pub role: UserRole,

    /// Admin who issued the code
    pub created_by: Uuid,

    /// User who redeemed the code (None while unused)
    pub used_by: Option<Uuid>,

    pub used_at: Option<DateTime<Utc>>,

    /// Optional expiry; None = never expires
    pub expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl InviteCode {
    /// Whether the code can still be redeemed
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        if self.used_by.is_some() {
            return false;
        }
        match self.expires_at {
            Some(expiry) => now < expiry,
            None => true,
        }
    }

    /// Generates a fresh random code string (`fb_` + 20 base62 chars)
    pub fn generate_code() -> String {
        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();

        let random: String = (0..CODE_RANDOM_LENGTH)
            .map(|_| {
                let idx = rng.gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect();

        format!("{}{}", CODE_PREFIX, random)
    }

    /// Issues a new invite code bound to `role`
    pub async fn create(
        executor: impl sqlx::PgExecutor<'_>,
        role: UserRole,
        created_by: Uuid,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, InviteCode>(
            r#"
            INSERT INTO invite_codes (code, role, created_by, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, role, created_by, used_by, used_at, expires_at, created_at
            "#,
        )
        .bind(Self::generate_code())
        .bind(role)
        .bind(created_by)
        .bind(expires_at)
        .fetch_one(executor)
        .await
    }

    /// Finds a code by its string value
    pub async fn find_by_code(
        executor: impl sqlx::PgExecutor<'_>,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InviteCode>(
            r#"
            SELECT id, code, role, created_by, used_by, used_at, expires_at, created_at
            FROM invite_codes
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(executor)
        .await
    }

    /// Marks a code used by `user_id`, guarding against double redemption
    ///
    /// The `used_by IS NULL` predicate makes the update a compare-and-set:
    /// if two signups race on the same code inside their transactions, only
    /// one sees `rows_affected == 1`. Returns false when the code was
    /// already taken.
    pub async fn mark_used(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE invite_codes
            SET used_by = $2, used_at = NOW()
            WHERE id = $1 AND used_by IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists codes newest-first
    pub async fn list(
        executor: impl sqlx::PgExecutor<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, InviteCode>(
            r#"
            SELECT id, code, role, created_by, used_by, used_at, expires_at, created_at
            FROM invite_codes
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    /// Counts all codes (for pagination totals)
    pub async fn count(executor: impl sqlx::PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM invite_codes")
            .fetch_one(executor)
            .await
    }

    /// Deletes an unused code; used codes are kept for the audit trail
    pub async fn revoke(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM invite_codes WHERE id = $1 AND used_by IS NULL")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(used: bool, expires_at: Option<DateTime<Utc>>) -> InviteCode {
        InviteCode {
            id: Uuid::new_v4(),
            code: InviteCode::generate_code(),
            role: UserRole::Developer,
            created_by: Uuid::new_v4(),
            used_by: used.then(Uuid::new_v4),
            used_at: used.then(Utc::now),
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_code_format() {
        let code = InviteCode::generate_code();
        assert!(code.starts_with("fb_"));
        assert_eq!(code.len(), 23);
        assert!(code["fb_".len()..].chars().all(|c| c.is_alphanumeric()));
    }

    #[test]
    fn test_generated_codes_differ() {
        assert_ne!(InviteCode::generate_code(), InviteCode::generate_code());
    }

    #[test]
    fn test_unused_unexpired_is_redeemable() {
        let code = sample(false, None);
        assert!(code.is_redeemable(Utc::now()));

        let code = sample(false, Some(Utc::now() + Duration::hours(1)));
        assert!(code.is_redeemable(Utc::now()));
    }

    #[test]
    fn test_used_code_is_not_redeemable() {
        let code = sample(true, None);
        assert!(!code.is_redeemable(Utc::now()));
    }

    #[test]
    fn test_expired_code_is_not_redeemable() {
        let code = sample(false, Some(Utc::now() - Duration::minutes(1)));
        assert!(!code.is_redeemable(Utc::now()));
    }
}
