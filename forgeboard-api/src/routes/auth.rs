/// Authentication endpoints
///
/// Signup with invite-gated registration, login with approval checks,
/// the password reset flow, and session self-service.
///
/// # Endpoints
///
/// - `POST /v1/auth/signup` - Register a new account
/// - `POST /v1/auth/login` - Authenticate and get a session token
/// - `POST /v1/auth/forgot-password` - Request a password reset email
/// - `POST /v1/auth/reset-password` - Consume a reset token
/// - `GET /v1/auth/me` - Current account
/// - `PUT /v1/auth/profile` - Update name/email
/// - `PUT /v1/auth/password` - Change password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    response::ApiResponse,
    routes::client_ip,
};
use axum::{extract::State, http::HeaderMap, Extension, Json};
use chrono::{Duration, Utc};
use forgeboard_shared::{
    audit::PostCommit,
    auth::{access::Caller, jwt, password, reset},
    models::{
        activity_log::ActivityType,
        invite_code::InviteCode,
        password_reset::PasswordReset,
        user::{CreateUser, User, UserRole},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

/// Reset tokens live for 30 minutes
const RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Requested role; defaults to client
    pub role: Option<UserRole>,

    /// Required for any role other than client
    pub invite_code: Option<String>,
}

/// Signup response
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,

    /// Present only for approved accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Reset-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub token: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Register a new account
///
/// Clients self-register and are approved immediately. Privileged roles
/// (developer, admin, super_admin) must present an unused, unexpired invite
/// code bound to that exact role; the redemption and the user insert run in
/// one transaction so a code is never consumed without an account existing.
///
/// Developers and admins are created pending approval and receive no
/// session token.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, missing or invalid invite code
/// - `409 Conflict`: Email already exists, invite code already redeemed
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Json<ApiResponse<SessionResponse>>> {
    req.validate().map_err(ApiError::from_validation)?;

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let role = req.role.unwrap_or(UserRole::Client);
    let password_hash = password::hash_password(&req.password)?;

    let mut tx = state.db.begin().await?;

    // Privileged roles are gated by a role-bound invite code
    let invite = if role.requires_invite() {
        let code = req
            .invite_code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ApiError::BadRequest("Invite code is required for this role".to_string())
            })?;

        let invite = InviteCode::find_by_code(&mut *tx, code)
            .await?
            .ok_or_else(|| ApiError::BadRequest("Invalid invite code".to_string()))?;

        if invite.role != role {
            return Err(ApiError::BadRequest(
                "Invite code is not valid for this role".to_string(),
            ));
        }
        if invite.used_by.is_some() {
            return Err(ApiError::Conflict(
                "Invite code was already used".to_string(),
            ));
        }
        if !invite.is_redeemable(Utc::now()) {
            return Err(ApiError::BadRequest("Invite code has expired".to_string()));
        }

        Some(invite)
    } else {
        None
    };

    let user = User::create(
        &mut *tx,
        CreateUser {
            email: req.email.to_lowercase(),
            password_hash,
            name: req.name.clone(),
            role,
            is_approved: if role.auto_approved() { Some(true) } else { None },
        },
    )
    .await?;

    if let Some(invite) = &invite {
        // Compare-and-set; a racing signup on the same code loses here
        let redeemed = InviteCode::mark_used(&mut *tx, invite.id, user.id).await?;
        if !redeemed {
            return Err(ApiError::Conflict(
                "Invite code was already used".to_string(),
            ));
        }
    }

    tx.commit().await?;

    let mut effects = PostCommit::new(user.id);
    effects.activity(
        ActivityType::UserRegistered,
        Some(user.id),
        Some("user"),
        json!({ "role": role, "invited": invite.is_some() }),
    );
    effects.run(&state.db).await;

    state.mailer.send(
        &user.email,
        "welcome",
        json!({ "name": user.name, "pendingApproval": user.is_approved.is_none() }),
    );

    // Pending accounts get no session until approved
    let token = if user.is_approved == Some(true) {
        let claims = jwt::Claims::new(user.id, user.role);
        Some(jwt::create_token(&claims, state.jwt_secret())?)
    } else {
        None
    };

    let message = if token.is_some() {
        "Account created"
    } else {
        "Account created and awaiting approval"
    };

    Ok(Json(ApiResponse::with_message(
        SessionResponse { user, token },
        message,
    )))
}

/// Authenticate and issue a session token
///
/// Order of checks: credentials, then active flag, then approval state.
/// Pending accounts get a 403 carrying `needsApproval: true` and no token.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials or deactivated account
/// - `403 Forbidden`: Pending or rejected account
/// - `429 Too Many Requests`: Too many attempts for this email + IP
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<SessionResponse>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let identity = format!("{}:{}", req.email.to_lowercase(), client_ip(&headers));
    state.login_limiter.check(&identity)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized(
            "Account is deactivated".to_string(),
        ));
    }

    match user.is_approved {
        Some(true) => {}
        None => return Err(ApiError::PendingApproval),
        Some(false) => {
            return Err(ApiError::Forbidden(
                "Your account registration was declined".to_string(),
            ))
        }
    }

    User::update_last_login(&state.db, user.id).await?;

    let claims = jwt::Claims::new(user.id, user.role);
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(Json(ApiResponse::new(SessionResponse {
        user,
        token: Some(token),
    })))
}

/// Request a password reset email
///
/// Always answers 200 so the endpoint does not reveal which emails
/// exist. For known accounts, issuance is capped per user over a sliding
/// window; the cap is checked against stored tokens, not in-process state,
/// so it survives restarts.
pub async fn forgot_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    req.validate().map_err(ApiError::from_validation)?;

    // Endpoint-level abuse brake, keyed by IP
    state.reset_limiter.check(&client_ip(&headers))?;

    let response = ApiResponse::message_only(
        "If an account exists for that email, a reset link has been sent",
    );

    let Some(user) = User::find_by_email(&state.db, &req.email).await? else {
        return Ok(Json(response));
    };

    let limits = state.config.rate_limits.reset;
    let recent = PasswordReset::recent_request_count(
        &state.db,
        user.id,
        Duration::seconds(limits.window_secs as i64),
    )
    .await?;

    if recent >= limits.max_requests as i64 {
        return Err(ApiError::RateLimitExceeded {
            retry_after: limits.window_secs,
            message: "Too many reset requests, please try again later".to_string(),
        });
    }

    let (token, token_hash) = reset::generate_reset_token();
    PasswordReset::create(
        &state.db,
        user.id,
        &token_hash,
        Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    )
    .await?;

    state.mailer.send(
        &user.email,
        "password_reset",
        json!({ "name": user.name, "token": token, "expiresInMinutes": RESET_TOKEN_TTL_MINUTES }),
    );

    Ok(Json(response))
}

/// Consume a reset token and set a new password
///
/// The token is single use: marking it used is a compare-and-set inside
/// the same transaction that updates the password and invalidates every
/// other live token for the user.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed, expired, or already-used token
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    req.validate().map_err(ApiError::from_validation)?;

    if !reset::validate_reset_token_format(&req.token) {
        return Err(ApiError::BadRequest(
            "Invalid or expired reset token".to_string(),
        ));
    }

    password::validate_password_strength(&req.password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message: e,
        }])
    })?;

    let token_hash = reset::hash_reset_token(&req.token);
    let password_hash = password::hash_password(&req.password)?;

    let mut tx = state.db.begin().await?;

    let record = PasswordReset::find_by_token_hash(&mut *tx, &token_hash)
        .await?
        .filter(|r| r.is_valid(Utc::now()))
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired reset token".to_string()))?;

    // Single use; a racing reset with the same token loses here
    let consumed = PasswordReset::mark_used(&mut *tx, record.id).await?;
    if !consumed {
        return Err(ApiError::BadRequest(
            "Invalid or expired reset token".to_string(),
        ));
    }

    PasswordReset::invalidate_others(&mut *tx, record.user_id, record.id).await?;
    User::set_password_hash(&mut *tx, record.user_id, &password_hash).await?;

    tx.commit().await?;

    let mut effects = PostCommit::new(record.user_id);
    effects.activity(
        ActivityType::PasswordResetCompleted,
        Some(record.user_id),
        Some("user"),
        json!({}),
    );
    effects.notify(
        record.user_id,
        "Password changed",
        "Your password was changed using a reset link.",
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::message_only("Password has been reset")))
}

/// Current account
pub async fn me(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let user = User::find_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::new(user)))
}

/// Update name and/or email
///
/// # Errors
///
/// - `409 Conflict`: New email already in use
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    req.validate().map_err(ApiError::from_validation)?;

    let user = User::update_profile(&state.db, caller.user_id, req.name, req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::with_message(user, "Profile updated")))
}

/// Change password (requires the current one)
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
pub async fn change_password(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    req.validate().map_err(ApiError::from_validation)?;

    password::validate_password_strength(&req.new_password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "new_password".to_string(),
            message: e,
        }])
    })?;

    let user = User::find_by_id(&state.db, caller.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let valid = password::verify_password(&req.current_password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.new_password)?;
    User::set_password_hash(&state.db, user.id, &password_hash).await?;

    let mut effects = PostCommit::new(user.id);
    effects.activity(
        ActivityType::PasswordChanged,
        Some(user.id),
        Some("user"),
        json!({}),
    );
    effects.run(&state.db).await;

    Ok(Json(ApiResponse::message_only("Password changed")))
}
