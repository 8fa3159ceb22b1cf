/// Activity log model
///
/// Append-only audit records: `{type, performer, target, details,
/// timestamp}`. Rows are never updated and never feed back into
/// authorization decisions; they are purely observational. The only way a
/// row disappears is the cascading deletion of its performer or target
/// project.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE activity_logs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     activity_type VARCHAR(64) NOT NULL,
///     performer_id UUID REFERENCES users(id) ON DELETE CASCADE,
///     target_id UUID,
///     target_type VARCHAR(64),
///     details JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Kinds of recorded activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    UserRegistered,
    UserApproved,
    UserRejected,
    UserRoleChanged,
    UserPermissionsChanged,
    UserDeactivated,
    UserDeleted,
    PasswordChanged,
    PasswordResetCompleted,
    InviteCreated,
    InviteRevoked,
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,
    MemberAdded,
    MemberRemoved,
    TaskCreated,
    TaskUpdated,
    TaskAssigned,
    TaskStatusChanged,
    TaskDeleted,
    TimeLogged,
    CommentAdded,
    ContactReceived,
    SettingsUpdated,
}

impl ActivityType {
    /// Wire/database representation, e.g. `USER_APPROVED`
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::UserRegistered => "USER_REGISTERED",
            ActivityType::UserApproved => "USER_APPROVED",
            ActivityType::UserRejected => "USER_REJECTED",
            ActivityType::UserRoleChanged => "USER_ROLE_CHANGED",
            ActivityType::UserPermissionsChanged => "USER_PERMISSIONS_CHANGED",
            ActivityType::UserDeactivated => "USER_DEACTIVATED",
            ActivityType::UserDeleted => "USER_DELETED",
            ActivityType::PasswordChanged => "PASSWORD_CHANGED",
            ActivityType::PasswordResetCompleted => "PASSWORD_RESET_COMPLETED",
            ActivityType::InviteCreated => "INVITE_CREATED",
            ActivityType::InviteRevoked => "INVITE_REVOKED",
            ActivityType::ProjectCreated => "PROJECT_CREATED",
            ActivityType::ProjectUpdated => "PROJECT_UPDATED",
            ActivityType::ProjectDeleted => "PROJECT_DELETED",
            ActivityType::MemberAdded => "MEMBER_ADDED",
            ActivityType::MemberRemoved => "MEMBER_REMOVED",
            ActivityType::TaskCreated => "TASK_CREATED",
            ActivityType::TaskUpdated => "TASK_UPDATED",
            ActivityType::TaskAssigned => "TASK_ASSIGNED",
            ActivityType::TaskStatusChanged => "TASK_STATUS_CHANGED",
            ActivityType::TaskDeleted => "TASK_DELETED",
            ActivityType::TimeLogged => "TIME_LOGGED",
            ActivityType::CommentAdded => "COMMENT_ADDED",
            ActivityType::ContactReceived => "CONTACT_RECEIVED",
            ActivityType::SettingsUpdated => "SETTINGS_UPDATED",
        }
    }
}

/// Activity log row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityLog {
    pub id: Uuid,

    /// Activity kind, e.g. "USER_APPROVED"
    pub activity_type: String,

    /// User who performed the action; `None` for anonymous submissions
    pub performer_id: Option<Uuid>,

    /// Affected record, if any
    pub target_id: Option<Uuid>,

    /// Kind of affected record ("user", "project", "task", ...)
    pub target_type: Option<String>,

    /// Free-form detail payload
    pub details: JsonValue,

    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// Appends one activity record
    pub async fn append(
        executor: impl sqlx::PgExecutor<'_>,
        activity_type: ActivityType,
        performer_id: Option<Uuid>,
        target_id: Option<Uuid>,
        target_type: Option<&str>,
        details: JsonValue,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (activity_type, performer_id, target_id, target_type, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, activity_type, performer_id, target_id, target_type, details, created_at
            "#,
        )
        .bind(activity_type.as_str())
        .bind(performer_id)
        .bind(target_id)
        .bind(target_type)
        .bind(details)
        .fetch_one(executor)
        .await
    }

    /// Lists records newest-first
    pub async fn list(
        executor: impl sqlx::PgExecutor<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, activity_type, performer_id, target_id, target_type, details, created_at
            FROM activity_logs
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
        sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_wire_format() {
        assert_eq!(ActivityType::UserApproved.as_str(), "USER_APPROVED");
        assert_eq!(ActivityType::TaskStatusChanged.as_str(), "TASK_STATUS_CHANGED");
        assert_eq!(
            ActivityType::PasswordResetCompleted.as_str(),
            "PASSWORD_RESET_COMPLETED"
        );
    }
}
