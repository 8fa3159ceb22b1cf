/// Settings endpoints
///
/// A small key/value store for operator-tunable configuration. Reads and
/// writes both require an admin-level session; values are arbitrary JSON.
///
/// # Endpoints
///
/// - `GET /v1/settings` - List all settings
/// - `GET /v1/settings/:key` - Get one setting
/// - `PUT /v1/settings/:key` - Upsert a setting

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use forgeboard_shared::{
    audit::PostCommit,
    auth::access::Caller,
    models::{activity_log::ActivityType, setting::Setting},
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct PutSettingRequest {
    pub value: serde_json::Value,
}

fn require_admin(caller: &Caller) -> ApiResult<()> {
    if !caller.role.is_admin_level() {
        return Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }
    Ok(())
}

/// List all settings
pub async fn list_settings(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<ApiResponse<Vec<Setting>>>> {
    require_admin(&caller)?;

    let settings = Setting::list(&state.db).await?;
    Ok(Json(ApiResponse::new(settings)))
}

/// Get one setting
pub async fn get_setting(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(key): Path<String>,
) -> ApiResult<Json<ApiResponse<Setting>>> {
    require_admin(&caller)?;

    let setting = Setting::get(&state.db, &key)
        .await?
        .ok_or_else(|| ApiError::NotFound("Setting not found".to_string()))?;

    Ok(Json(ApiResponse::new(setting)))
}

/// Create or replace a setting
pub async fn put_setting(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(key): Path<String>,
    Json(req): Json<PutSettingRequest>,
) -> ApiResult<Json<ApiResponse<Setting>>> {
    require_admin(&caller)?;

    if key.is_empty() || key.len() > 100 {
        return Err(ApiError::BadRequest(
            "Setting key must be 1-100 characters".to_string(),
        ));
    }

    let setting = Setting::put(&state.db, &key, req.value).await?;

    let mut effects = PostCommit::new(caller.user_id);
    effects.activity(
        ActivityType::SettingsUpdated,
        None,
        Some("setting"),
        json!({ "key": key }),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::with_message(setting, "Setting saved")))
}
