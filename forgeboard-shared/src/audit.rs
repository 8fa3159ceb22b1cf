/// Post-commit side effects: activity records and notifications
///
/// Mutating handlers collect their side effects into a [`PostCommit`] list
/// while the transaction is open, commit, and then run the list against the
/// pool. A failed effect is logged and skipped; the committed mutation is
/// never rolled back for it, and remaining effects still run.
///
/// # Example
///
/// ```no_run
/// use forgeboard_shared::audit::PostCommit;
/// use forgeboard_shared::models::activity_log::ActivityType;
/// use serde_json::json;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, admin_id: Uuid, user_id: Uuid) {
/// let mut effects = PostCommit::new(admin_id);
/// effects.activity(
///     ActivityType::UserApproved,
///     Some(user_id),
///     Some("user"),
///     json!({ "approved": true }),
/// );
/// effects.notify(user_id, "Account approved", "You can now sign in.");
/// // ... commit the transaction first ...
/// effects.run(&pool).await;
/// # }
/// ```

use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::activity_log::{ActivityLog, ActivityType};
use crate::models::notification::Notification;

/// One pending activity record
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub activity_type: ActivityType,
    pub target_id: Option<Uuid>,
    pub target_type: Option<String>,
    pub details: JsonValue,
}

/// One pending notification
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
}

/// Appends one activity record, logging instead of failing
///
/// For one-off appends outside a [`PostCommit`] list, such as anonymous
/// contact intake where no performer exists.
pub async fn record(
    pool: &PgPool,
    activity_type: ActivityType,
    performer_id: Option<Uuid>,
    target_id: Option<Uuid>,
    target_type: Option<&str>,
    details: JsonValue,
) {
    if let Err(e) = ActivityLog::append(
        pool,
        activity_type,
        performer_id,
        target_id,
        target_type,
        details,
    )
    .await
    {
        tracing::warn!(
            error = %e,
            activity_type = activity_type.as_str(),
            "failed to append activity record"
        );
    }
}

/// Side effects collected during a mutation, executed after commit
#[derive(Debug)]
pub struct PostCommit {
    performer_id: Uuid,
    entries: Vec<AuditEntry>,
    notifications: Vec<NotificationDraft>,
}

impl PostCommit {
    /// Starts an empty effect list attributed to one performer
    pub fn new(performer_id: Uuid) -> Self {
        Self {
            performer_id,
            entries: Vec::new(),
            notifications: Vec::new(),
        }
    }

    /// Queues an activity record
    pub fn activity(
        &mut self,
        activity_type: ActivityType,
        target_id: Option<Uuid>,
        target_type: Option<&str>,
        details: JsonValue,
    ) {
        self.entries.push(AuditEntry {
            activity_type,
            target_id,
            target_type: target_type.map(|s| s.to_string()),
            details,
        });
    }

    /// Queues a notification for a user
    pub fn notify(&mut self, user_id: Uuid, title: &str, body: &str) {
        self.notifications.push(NotificationDraft {
            user_id,
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    /// Number of queued effects
    pub fn len(&self) -> usize {
        self.entries.len() + self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.notifications.is_empty()
    }

    /// Executes every queued effect against the pool
    ///
    /// Call this only after the owning transaction has committed. Each
    /// failure is logged at warn level and the rest still run.
    pub async fn run(self, pool: &PgPool) {
        for entry in self.entries {
            record(
                pool,
                entry.activity_type,
                Some(self.performer_id),
                entry.target_id,
                entry.target_type.as_deref(),
                entry.details,
            )
            .await;
        }

        for draft in self.notifications {
            if let Err(e) =
                Notification::create(pool, draft.user_id, &draft.title, &draft.body).await
            {
                tracing::warn!(
                    user_id = %draft.user_id,
                    error = %e,
                    "failed to create notification"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_queueing() {
        let mut effects = PostCommit::new(Uuid::new_v4());
        assert!(effects.is_empty());

        effects.activity(
            ActivityType::ProjectCreated,
            Some(Uuid::new_v4()),
            Some("project"),
            json!({ "name": "Website refresh" }),
        );
        effects.notify(Uuid::new_v4(), "New project", "You were added to a project.");
        effects.notify(Uuid::new_v4(), "New project", "You were added to a project.");

        assert_eq!(effects.len(), 3);
        assert!(!effects.is_empty());
    }

    #[test]
    fn test_entry_fields() {
        let performer = Uuid::new_v4();
        let target = Uuid::new_v4();

        let mut effects = PostCommit::new(performer);
        effects.activity(
            ActivityType::TaskAssigned,
            Some(target),
            Some("task"),
            json!({ "assignee": "dev" }),
        );

        let entry = &effects.entries[0];
        assert_eq!(entry.target_id, Some(target));
        assert_eq!(entry.target_type.as_deref(), Some("task"));
        assert_eq!(entry.details["assignee"], "dev");
    }
}
