/// User administration endpoints
///
/// Listing and moderating accounts, issuing invite codes, browsing the
/// activity log, and dashboard stats. Every handler here runs the caller
/// through the authorization engine; role alone grants nothing except for
/// super admins.
///
/// # Endpoints
///
/// - `GET    /v1/admin/users` - List users (filterable, paginated)
/// - `GET    /v1/admin/users/:id` - Get one user
/// - `POST   /v1/admin/users/:id/approve` - Approve a pending account
/// - `POST   /v1/admin/users/:id/reject` - Reject a pending account
/// - `PUT    /v1/admin/users/:id/role` - Change role
/// - `PUT    /v1/admin/users/:id/permissions` - Edit permission flags
/// - `POST   /v1/admin/users/:id/deactivate` - Soft-disable an account
/// - `DELETE /v1/admin/users/:id` - Delete an account
/// - `POST   /v1/admin/invites` / `GET /v1/admin/invites` / `DELETE /v1/admin/invites/:id`
/// - `GET    /v1/admin/activity` - Activity log
/// - `GET    /v1/admin/stats` - Dashboard counts

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ApiResponse, PageQuery, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use forgeboard_shared::{
    audit::PostCommit,
    auth::access::{authorize, Access, Caller, Permission},
    models::{
        activity_log::{ActivityLog, ActivityType},
        invite_code::InviteCode,
        user::{UpdatePermissions, User, UserFilter, UserRole},
    },
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// User list filters
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<UserRole>,

    /// Only accounts awaiting approval
    pub pending: Option<bool>,

    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Role change request
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: UserRole,
}

/// Invite creation request
#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    pub role: UserRole,
    pub expires_at: Option<DateTime<Utc>>,
}

/// List users, filterable by role and approval state
pub async fn list_users(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<User>>>> {
    authorize(&caller, &Access::new().permission(Permission::ApproveUsers))?;

    let filter = UserFilter {
        role: query.role,
        pending_only: query.pending.unwrap_or(false),
    };

    let paging = PageQuery {
        page: query.page,
        per_page: query.per_page,
    };
    let (page, per_page) = paging.clamp();
    let (limit, offset) = paging.limit_offset();

    let users = User::list(&state.db, &filter, limit, offset).await?;
    let total = User::count(&state.db, &filter).await?;

    Ok(Json(ApiResponse::paginated(
        users,
        Pagination::new(page, per_page, total),
    )))
}

/// Get one user
pub async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<User>>> {
    authorize(&caller, &Access::new().permission(Permission::ApproveUsers))?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::new(user)))
}

/// Approve a pending account
///
/// Writes a `USER_APPROVED` audit entry and notifies the account.
pub async fn approve_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<User>>> {
    authorize(&caller, &Access::new().permission(Permission::ApproveUsers))?;

    let user = User::set_approval(&state.db, id, true)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::UserApproved,
        Some(user.id),
        Some("user"),
        json!({ "email": user.email }),
    );
    effects.notify(
        user.id,
        "Account approved",
        "Your account has been approved. You can now sign in.",
    );
    effects.run(&state.db).await;

    state
        .mailer
        .send(&user.email, "account_approved", json!({ "name": user.name }));

    Ok(Json(ApiResponse::with_message(user, "User approved")))
}

/// Reject a pending account
pub async fn reject_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<User>>> {
    authorize(&caller, &Access::new().permission(Permission::ApproveUsers))?;

    let user = User::set_approval(&state.db, id, false)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::UserRejected,
        Some(user.id),
        Some("user"),
        json!({ "email": user.email }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(user, "User rejected")))
}

/// Change a user's role
///
/// Granting or taking the super_admin role is itself super-admin-only;
/// other role changes need the approve-users flag.
pub async fn set_user_role(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetRoleRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let current = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let touches_super_admin =
        req.role == UserRole::SuperAdmin || current.role == UserRole::SuperAdmin;

    let access = if touches_super_admin {
        Access::new().super_admin_only()
    } else {
        Access::new().permission(Permission::ApproveUsers)
    };
    authorize(&caller, &access)?;

    let user = User::set_role(&state.db, id, req.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::UserRoleChanged,
        Some(user.id),
        Some("user"),
        json!({ "from": current.role, "to": req.role }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(user, "Role updated")))
}

/// Edit a user's permission flags
///
/// Editing a super admin's flags is super-admin-only (they are inert for
/// super admins, but the audit trail should still be honest about who can
/// touch those accounts).
pub async fn set_user_permissions(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePermissions>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let current = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let access = if current.role == UserRole::SuperAdmin {
        Access::new().super_admin_only()
    } else {
        Access::new().permission(Permission::ApproveUsers)
    };
    authorize(&caller, &access)?;

    let user = User::set_permissions(&state.db, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::UserPermissionsChanged,
        Some(user.id),
        Some("user"),
        json!({
            "can_approve_users": user.can_approve_users,
            "can_delete_users": user.can_delete_users,
            "can_manage_projects": user.can_manage_projects,
            "can_assign_tasks": user.can_assign_tasks,
            "can_view_all_projects": user.can_view_all_projects,
        }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(user, "Permissions updated")))
}

/// Soft-disable an account
///
/// The row and its history stay; the user just can't sign in.
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    authorize(&caller, &Access::new().permission(Permission::DeleteUsers))?;

    if id == caller.user_id {
        return Err(ApiError::BadRequest(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let found = User::set_active(&state.db, id, false).await?;
    if !found {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::UserDeactivated,
        Some(id),
        Some("user"),
        json!({}),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::message_only("User deactivated")))
}

/// Delete an account
///
/// Blocked with a conflict while the user still owns projects; those must
/// be reassigned or deleted first. Memberships, task assignments,
/// notifications, and reset tokens are detached in the same transaction as
/// the row deletion.
///
/// # Errors
///
/// - `409 Conflict`: User still owns projects or created tasks
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    authorize(&caller, &Access::new().permission(Permission::DeleteUsers))?;

    if id == caller.user_id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let target = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if target.role == UserRole::SuperAdmin {
        authorize(&caller, &Access::new().super_admin_only())?;
    }

    let mut tx = state.db.begin().await?;

    let owned = User::owned_project_count(&mut *tx, id).await?;
    if owned > 0 {
        return Err(ApiError::Conflict(format!(
            "User still owns {} project(s); reassign or delete them first",
            owned
        )));
    }

    let created = User::created_task_count(&mut *tx, id).await?;
    if created > 0 {
        return Err(ApiError::Conflict(format!(
            "User created {} task(s) that still exist; delete them first",
            created
        )));
    }

    User::detach_references(&mut tx, id).await?;
    User::delete(&mut *tx, id).await?;

    tx.commit().await?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::UserDeleted,
        Some(id),
        Some("user"),
        json!({ "email": target.email }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::message_only("User deleted")))
}

/// Issue an invite code bound to a role
///
/// Codes for the super_admin role can only be issued by a super admin.
pub async fn create_invite(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<CreateInviteRequest>,
) -> ApiResult<Json<ApiResponse<InviteCode>>> {
    let access = if req.role == UserRole::SuperAdmin {
        Access::new().super_admin_only()
    } else {
        Access::new().permission(Permission::ApproveUsers)
    };
    authorize(&caller, &access)?;

    if req.role == UserRole::Client {
        return Err(ApiError::BadRequest(
            "Clients register without invite codes".to_string(),
        ));
    }

    if let Some(expiry) = req.expires_at {
        if expiry <= Utc::now() {
            return Err(ApiError::BadRequest(
                "Expiry must be in the future".to_string(),
            ));
        }
    }

    let invite = InviteCode::create(&state.db, req.role, caller.user_id, req.expires_at).await?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::InviteCreated,
        Some(invite.id),
        Some("invite"),
        json!({ "role": invite.role }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(invite, "Invite created")))
}

/// List invite codes, newest first
pub async fn list_invites(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<Vec<InviteCode>>>> {
    authorize(&caller, &Access::new().permission(Permission::ApproveUsers))?;

    let (page_no, per_page) = page.clamp();
    let (limit, offset) = page.limit_offset();

    let invites = InviteCode::list(&state.db, limit, offset).await?;
    let total = InviteCode::count(&state.db).await?;

    Ok(Json(ApiResponse::paginated(
        invites,
        Pagination::new(page_no, per_page, total),
    )))
}

/// Revoke an unused invite code
///
/// # Errors
///
/// - `404 Not Found`: Unknown code, or already redeemed
pub async fn revoke_invite(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    authorize(&caller, &Access::new().permission(Permission::ApproveUsers))?;

    let revoked = InviteCode::revoke(&state.db, id).await?;
    if !revoked {
        return Err(ApiError::NotFound(
            "Invite code not found or already used".to_string(),
        ));
    }

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::InviteRevoked,
        Some(id),
        Some("invite"),
        json!({}),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::message_only("Invite revoked")))
}

/// Browse the activity log, newest first
pub async fn list_activity(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ActivityLog>>>> {
    authorize(&caller, &Access::new().permission(Permission::ApproveUsers))?;

    let (page_no, per_page) = page.clamp();
    let (limit, offset) = page.limit_offset();

    let entries = ActivityLog::list(&state.db, limit, offset).await?;
    let total = ActivityLog::count(&state.db).await?;

    Ok(Json(ApiResponse::paginated(
        entries,
        Pagination::new(page_no, per_page, total),
    )))
}

/// Dashboard counts: users, pending approvals, projects, tasks
pub async fn stats(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    authorize(&caller, &Access::new().permission(Permission::ApproveUsers))?;

    let total_users = User::count(&state.db, &UserFilter::default()).await?;
    let pending_users = User::count(
        &state.db,
        &UserFilter {
            role: None,
            pending_only: true,
        },
    )
    .await?;

    let total_projects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
        .fetch_one(&state.db)
        .await?;
    let total_tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(&state.db)
        .await?;
    let open_contact: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages WHERE status = 'new'")
            .fetch_one(&state.db)
            .await?;

    Ok(Json(ApiResponse::new(json!({
        "users": total_users,
        "pendingApprovals": pending_users,
        "projects": total_projects,
        "tasks": total_tasks,
        "openContactMessages": open_contact,
    }))))
}
