/// Notification endpoints
///
/// Strictly owner-scoped: every query and mutation is keyed on the
/// caller's user id, so one user can never read or touch another's
/// notifications.
///
/// # Endpoints
///
/// - `GET    /v1/notifications` - List the caller's notifications (paginated)
/// - `GET    /v1/notifications/unread-count` - Unread badge count
/// - `POST   /v1/notifications/:id/read` - Mark one read
/// - `POST   /v1/notifications/read-all` - Mark everything read
/// - `DELETE /v1/notifications/:id` - Delete one

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ApiResponse, PageQuery, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use forgeboard_shared::{auth::access::Caller, models::notification::Notification};
use serde_json::json;
use uuid::Uuid;

/// List the caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Notification>>>> {
    let (page_no, per_page) = page.clamp();
    let (limit, offset) = page.limit_offset();

    let notifications =
        Notification::list_for_user(&state.db, caller.user_id, limit, offset).await?;
    let total = Notification::count_for_user(&state.db, caller.user_id).await?;

    Ok(Json(ApiResponse::paginated(
        notifications,
        Pagination::new(page_no, per_page, total),
    )))
}

/// Unread count for the caller
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let count = Notification::unread_count(&state.db, caller.user_id).await?;
    Ok(Json(ApiResponse::new(json!({ "unread": count }))))
}

/// Mark one notification read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let updated = Notification::mark_read(&state.db, id, caller.user_id).await?;
    if !updated {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(ApiResponse::message_only("Notification marked read")))
}

/// Mark all of the caller's notifications read
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let updated = Notification::mark_all_read(&state.db, caller.user_id).await?;

    Ok(Json(ApiResponse::with_message(
        json!({ "updated": updated }),
        "All notifications marked read",
    )))
}

/// Delete one notification
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let deleted = Notification::delete(&state.db, id, caller.user_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(Json(ApiResponse::message_only("Notification deleted")))
}
