/// User model and database operations
///
/// Users carry a global role plus five independent boolean permission
/// grants. A SUPER_ADMIN implicitly holds every permission regardless of
/// the stored flags; that override lives in the authorization engine
/// (`auth::access`), not here.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('super_admin', 'admin', 'developer', 'client');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'client',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_approved BOOLEAN,
///     can_approve_users BOOLEAN NOT NULL DEFAULT FALSE,
///     can_delete_users BOOLEAN NOT NULL DEFAULT FALSE,
///     can_manage_projects BOOLEAN NOT NULL DEFAULT FALSE,
///     can_assign_tasks BOOLEAN NOT NULL DEFAULT FALSE,
///     can_view_all_projects BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// `is_approved` is tri-state: NULL means pending approval, TRUE approved,
/// FALSE rejected. Clients and super admins are auto-approved at signup;
/// developers and admins start as NULL.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Global account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Unrestricted access, passes every authorization check
    SuperAdmin,

    /// Administrative access gated by explicit permission flags
    Admin,

    /// Works on assigned project tasks
    Developer,

    /// Owns projects, sees only their own data by default
    Client,
}

impl UserRole {
    /// Converts role to its wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::Admin => "admin",
            UserRole::Developer => "developer",
            UserRole::Client => "client",
        }
    }

    /// Parses a role from its wire representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "super_admin" => Some(UserRole::SuperAdmin),
            "admin" => Some(UserRole::Admin),
            "developer" => Some(UserRole::Developer),
            "client" => Some(UserRole::Client),
            _ => None,
        }
    }

    /// Admin-level roles bypass ownership checks on project/task reads
    pub fn is_admin_level(&self) -> bool {
        matches!(self, UserRole::SuperAdmin | UserRole::Admin)
    }

    /// Whether signup with this role requires a matching invite code
    pub fn requires_invite(&self) -> bool {
        !matches!(self, UserRole::Client)
    }

    /// Whether accounts with this role are approved at signup
    ///
    /// Clients self-serve; a super-admin signup already went through a
    /// super-admin-bound invite code, so no second gate. Developers and
    /// admins wait for approval.
    pub fn auto_approved(&self) -> bool {
        matches!(self, UserRole::Client | UserRole::SuperAdmin)
    }

    /// Session token lifetime for this role
    ///
    /// Privileged roles get short sessions and re-authenticate more often.
    pub fn session_ttl(&self) -> Duration {
        match self {
            UserRole::SuperAdmin | UserRole::Admin => Duration::hours(8),
            UserRole::Developer | UserRole::Client => Duration::days(7),
        }
    }
}

/// User model representing an account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique, stored lowercase
    pub email: String,

    /// Argon2id password hash, never plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Global role
    pub role: UserRole,

    /// Soft-disable flag; inactive users cannot log in
    pub is_active: bool,

    /// Approval tri-state: None pending, Some(true) approved, Some(false) rejected
    pub is_approved: Option<bool>,

    /// Permission grant: may approve/reject pending users
    pub can_approve_users: bool,

    /// Permission grant: may delete users
    pub can_delete_users: bool,

    /// Permission grant: may create/update/delete any project
    pub can_manage_projects: bool,

    /// Permission grant: may assign tasks to users
    pub can_assign_tasks: bool,

    /// Visibility grant: sees every project, not just owned/member ones
    pub can_view_all_projects: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// When the user last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email address (caller lowercases before insert)
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Display name
    pub name: String,

    /// Requested role
    pub role: UserRole,

    /// Initial approval state (see `UserRole::auto_approved`)
    pub is_approved: Option<bool>,
}

/// Input for updating permission grants
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePermissions {
    pub can_approve_users: Option<bool>,
    pub can_delete_users: Option<bool>,
    pub can_manage_projects: Option<bool>,
    pub can_assign_tasks: Option<bool>,
    pub can_view_all_projects: Option<bool>,
}

/// Filter for admin user listings
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Restrict to one role
    pub role: Option<UserRole>,

    /// Only users pending approval (is_approved IS NULL)
    pub pending_only: bool,
}

const USER_COLUMNS: &str = "id, email, password_hash, name, role, is_active, is_approved, \
     can_approve_users, can_delete_users, can_manage_projects, can_assign_tasks, \
     can_view_all_projects, created_at, updated_at, last_login_at";

impl User {
    /// Creates a new user
    ///
    /// Takes any executor so signup can run inside the invite-redemption
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate email (unique constraint) or
    /// connection failure.
    pub async fn create(
        executor: impl sqlx::PgExecutor<'_>,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, role, is_approved)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.name)
        .bind(data.role)
        .bind(data.is_approved)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a user by email address (stored lowercase)
    pub async fn find_by_email(
        executor: impl sqlx::PgExecutor<'_>,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(executor)
        .await
    }

    /// Lists users with pagination and an optional role/pending filter
    pub async fn list(
        executor: impl sqlx::PgExecutor<'_>,
        filter: &UserFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1");
        if filter.role.is_some() {
            query.push_str(" AND role = $3");
        }
        if filter.pending_only {
            query.push_str(" AND is_approved IS NULL");
        }
        query.push_str(" ORDER BY created_at DESC LIMIT $1 OFFSET $2");

        let mut q = sqlx::query_as::<_, User>(&query).bind(limit).bind(offset);
        if let Some(role) = filter.role {
            q = q.bind(role);
        }

        q.fetch_all(executor).await
    }

    /// Counts users matching the filter (for pagination totals)
    pub async fn count(
        executor: impl sqlx::PgExecutor<'_>,
        filter: &UserFilter,
    ) -> Result<i64, sqlx::Error> {
        let mut query = String::from("SELECT COUNT(*) FROM users WHERE 1 = 1");
        if filter.role.is_some() {
            query.push_str(" AND role = $1");
        }
        if filter.pending_only {
            query.push_str(" AND is_approved IS NULL");
        }

        let mut q = sqlx::query_scalar::<_, i64>(&query);
        if let Some(role) = filter.role {
            q = q.bind(role);
        }

        q.fetch_one(executor).await
    }

    /// Sets the approval state and returns the updated row
    pub async fn set_approval(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        approved: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET is_approved = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(executor)
        .await
    }

    /// Updates the user's role
    pub async fn set_role(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        role: UserRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(executor)
        .await
    }

    /// Updates permission grants; only provided flags change
    pub async fn set_permissions(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        data: UpdatePermissions,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                can_approve_users = COALESCE($2, can_approve_users),
                can_delete_users = COALESCE($3, can_delete_users),
                can_manage_projects = COALESCE($4, can_manage_projects),
                can_assign_tasks = COALESCE($5, can_assign_tasks),
                can_view_all_projects = COALESCE($6, can_view_all_projects),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.can_approve_users)
        .bind(data.can_delete_users)
        .bind(data.can_manage_projects)
        .bind(data.can_assign_tasks)
        .bind(data.can_view_all_projects)
        .fetch_optional(executor)
        .await
    }

    /// Updates profile fields (name and/or email)
    pub async fn update_profile(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE(LOWER($3), email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(executor)
        .await
    }

    /// Replaces the stored password hash
    pub async fn set_password_hash(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Soft-disables an account; inactive users fail the login active check
    pub async fn set_active(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
        active: bool,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(active)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Updates the last login timestamp after successful authentication
    pub async fn update_last_login(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts projects owned by this user
    ///
    /// Deletion is blocked while this is non-zero; callers surface a
    /// conflict error instead of cascading business data away.
    pub async fn owned_project_count(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE owner_id = $1")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Counts tasks created by this user
    ///
    /// Task authorship is kept for the audit trail, so deletion is blocked
    /// while this is non-zero, same as owned projects.
    pub async fn created_task_count(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE created_by = $1")
            .bind(id)
            .fetch_one(executor)
            .await
    }

    /// Deletes the user row itself
    ///
    /// Callers must first detach memberships/assignments inside the same
    /// transaction; see the admin delete handler.
    pub async fn delete(
        executor: impl sqlx::PgExecutor<'_>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Detaches project memberships and task assignments
    ///
    /// Run inside the user-deletion transaction so a mid-sequence failure
    /// leaves no partial state.
    pub async fn detach_references(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM project_members WHERE user_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        sqlx::query("UPDATE tasks SET assignee_id = NULL WHERE assignee_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [
            UserRole::SuperAdmin,
            UserRole::Admin,
            UserRole::Developer,
            UserRole::Client,
        ] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse("manager"), None);
    }

    #[test]
    fn test_invite_requirements() {
        assert!(!UserRole::Client.requires_invite());
        assert!(UserRole::Developer.requires_invite());
        assert!(UserRole::Admin.requires_invite());
        assert!(UserRole::SuperAdmin.requires_invite());
    }

    #[test]
    fn test_auto_approval() {
        assert!(UserRole::Client.auto_approved());
        assert!(UserRole::SuperAdmin.auto_approved());
        assert!(!UserRole::Developer.auto_approved());
        assert!(!UserRole::Admin.auto_approved());
    }

    #[test]
    fn test_session_ttl_is_shorter_for_privileged_roles() {
        assert!(UserRole::Admin.session_ttl() < UserRole::Client.session_ttl());
        assert!(UserRole::SuperAdmin.session_ttl() < UserRole::Developer.session_ttl());
    }
}
