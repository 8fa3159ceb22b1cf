/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which automatically converts
/// to the appropriate status code and `{ success: false, error }` envelope.
///
/// # Example
///
/// ```no_run
/// use forgeboard_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(ApiError::NotFound("Project not found".to_string()))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use forgeboard_shared::auth::{access::AccessError, jwt::JwtError, password::PasswordError};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Forbidden (403) for accounts awaiting approval; the body carries
    /// `needsApproval: true` so the client can show the right screen
    PendingApproval,

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - duplicate unique field, dependent records, terminal state
    Conflict(String),

    /// Validation failure (400, with per-field details)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Too many requests (429)
    RateLimitExceeded { retry_after: u64, message: String },

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response envelope, the mirror of `response::ApiResponse`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false for this shape
    pub success: bool,

    /// Human-readable error message
    pub message: String,

    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,

    /// Set on the pending-approval login denial
    #[serde(rename = "needsApproval", skip_serializing_if = "Option::is_none")]
    pub needs_approval: Option<bool>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::PendingApproval => write!(f, "Forbidden: account pending approval"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::RateLimitExceeded { message, .. } => {
                write!(f, "Rate limit exceeded: {}", message)
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Builds a ValidationError from validator's error map
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Rate limit responses carry a Retry-After header
        if let ApiError::RateLimitExceeded {
            retry_after,
            message,
        } = &self
        {
            let body = Json(ErrorResponse {
                success: false,
                message: message.clone(),
                error: "rate_limit_exceeded".to_string(),
                details: None,
                needs_approval: None,
            });

            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", value);
            }
            return response;
        }

        let (status, error_code, message, details, needs_approval) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None, None),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg, None, None)
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None, None),
            ApiError::PendingApproval => (
                StatusCode::FORBIDDEN,
                "pending_approval",
                "Your account is awaiting approval".to_string(),
                None,
                Some(true),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
                None,
            ),
            ApiError::RateLimitExceeded { message, .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limit_exceeded",
                message,
                None,
                None,
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: error_code.to_string(),
            details,
            needs_approval,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Translate constraint violations instead of leaking codes
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    if constraint.contains("invite_codes_code") {
                        return ApiError::Conflict("Invite code already exists".to_string());
                    }
                    if constraint.contains("owner_id") || constraint.contains("project_id") {
                        return ApiError::Conflict(
                            "Record has dependent records and cannot be removed".to_string(),
                        );
                    }
                    // Unknown constraints get a generic message; the name
                    // stays in the logs only
                    tracing::warn!(constraint, "unhandled database constraint violation");
                    return ApiError::Conflict(
                        "Record conflicts with existing data".to_string(),
                    );
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert authorization denials to API errors (all 403)
impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::SuperAdminOnly => {
                ApiError::Forbidden("This operation requires super admin access".to_string())
            }
            AccessError::MissingPermission(permission) => {
                ApiError::Forbidden(format!("Missing required permission: {}", permission))
            }
            AccessError::NotAuthorized => {
                ApiError::Forbidden("Not authorized to access this resource".to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => {
                ApiError::Unauthorized("Invalid token issuer".to_string())
            }
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[test]
    fn test_access_error_maps_to_forbidden() {
        use forgeboard_shared::auth::access::Permission;

        let err: ApiError = AccessError::MissingPermission(Permission::DeleteUsers).into();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err: ApiError = AccessError::SuperAdminOnly.into();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_pending_approval_envelope() {
        let body = serde_json::to_value(&ErrorResponse {
            success: false,
            message: "Your account is awaiting approval".to_string(),
            error: "pending_approval".to_string(),
            details: None,
            needs_approval: Some(true),
        })
        .unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["needsApproval"], true);
    }
}
