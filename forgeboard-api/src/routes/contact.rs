/// Contact intake endpoints
///
/// The submission endpoint is public and rate limited per client IP.
/// Review endpoints (list, triage, delete) require an admin-level
/// session.
///
/// # Endpoints
///
/// - `POST   /v1/contact` - Submit a message (public)
/// - `GET    /v1/contact` - List messages (admin, paginated)
/// - `PUT    /v1/contact/:id/status` - Triage a message (admin)
/// - `DELETE /v1/contact/:id` - Delete a message (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ApiResponse, PageQuery, Pagination},
    routes::client_ip,
};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Extension, Json,
};
use forgeboard_shared::{
    audit,
    auth::access::Caller,
    models::{
        activity_log::ActivityType,
        contact::{ContactMessage, ContactStatus, CreateContactMessage},
    },
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Contact form payload
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitContactRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 200, message = "Subject must be 1-200 characters"))]
    pub subject: String,

    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct SetContactStatusRequest {
    pub status: ContactStatus,
}

fn require_admin(caller: &Caller) -> ApiResult<()> {
    if !caller.role.is_admin_level() {
        return Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }
    Ok(())
}

/// Submit a contact message
///
/// No session required. Rate limited per client IP; the audit row has no
/// performer because the submitter is anonymous.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitContactRequest>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let ip = client_ip(&headers);
    state.contact_limiter.check(&ip)?;

    let message = ContactMessage::create(
        &state.db,
        CreateContactMessage {
            name: req.name,
            email: req.email.to_lowercase(),
            subject: req.subject,
            body: req.body,
        },
    )
    .await?;

    audit::record(
        &state.db,
        ActivityType::ContactReceived,
        None,
        Some(message.id),
        Some("contact_message"),
        json!({ "subject": message.subject }),
    )
    .await;

    Ok(Json(ApiResponse::with_message(
        json!({ "id": message.id }),
        "Thanks for reaching out. We'll get back to you soon.",
    )))
}

/// List contact messages, newest first
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ContactMessage>>>> {
    require_admin(&caller)?;

    let (page_no, per_page) = page.clamp();
    let (limit, offset) = page.limit_offset();

    let messages = ContactMessage::list(&state.db, limit, offset).await?;
    let total = ContactMessage::count(&state.db).await?;

    Ok(Json(ApiResponse::paginated(
        messages,
        Pagination::new(page_no, per_page, total),
    )))
}

/// Move a message through triage (new, in_review, closed)
pub async fn set_status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetContactStatusRequest>,
) -> ApiResult<Json<ApiResponse<ContactMessage>>> {
    require_admin(&caller)?;

    let message = ContactMessage::set_status(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Contact message not found".to_string()))?;

    Ok(Json(ApiResponse::with_message(message, "Status updated")))
}

/// Delete a contact message
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    require_admin(&caller)?;

    let deleted = ContactMessage::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Contact message not found".to_string()));
    }

    Ok(Json(ApiResponse::message_only("Contact message deleted")))
}
