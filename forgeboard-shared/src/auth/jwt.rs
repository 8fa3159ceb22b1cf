/// JWT session token generation and validation module
///
/// This module provides JWT (JSON Web Token) functionality for user sessions.
/// Tokens are signed using HS256 (HMAC-SHA256) and carry the user's identity
/// and role. There are no refresh tokens; a session lasts until its token
/// expires and the client logs in again.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Role-dependent (8 hours for admin-level users,
///   7 days for developers and clients)
/// - **Validation**: Signature, expiration, and issuer checks
/// - **Secret Management**: Secrets should be at least 32 bytes (256 bits)
///
/// # Example
///
/// ```
/// use forgeboard_shared::auth::jwt::{create_token, validate_token, Claims};
/// use forgeboard_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id, UserRole::Developer);
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid token format
    #[error("Invalid token format: {0}")]
    InvalidFormat(String),

    /// Invalid issuer
    #[error("Invalid issuer: expected {expected}, got {actual}")]
    InvalidIssuer { expected: String, actual: String },
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "forgeboard")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `role`: The user's role at token issue time. The role is re-read from
///   the database on every authenticated request; this claim only picks the
///   session length and survives as a diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "forgeboard"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Role at issue time (custom claim)
    pub role: UserRole,
}

impl Claims {
    /// Creates new claims with the role's default session length
    ///
    /// Admin-level roles get short sessions; developers and clients get
    /// week-long ones.
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self::with_expiration(user_id, role, role.session_ttl())
    }

    /// Creates claims with a custom expiration
    ///
    /// # Example
    ///
    /// ```
    /// use forgeboard_shared::auth::jwt::Claims;
    /// use forgeboard_shared::models::user::UserRole;
    /// use chrono::Duration;
    /// use uuid::Uuid;
    ///
    /// let claims = Claims::with_expiration(
    ///     Uuid::new_v4(),
    ///     UserRole::Client,
    ///     Duration::hours(1),
    /// );
    /// ```
    pub fn with_expiration(user_id: Uuid, role: UserRole, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: "forgeboard".to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            role,
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Gets time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now().timestamp();
        if self.exp > now {
            Some(Duration::seconds(self.exp - now))
        } else {
            None
        }
    }
}

/// Creates a JWT token from claims
///
/// Signs the token using HS256 (HMAC-SHA256) with the provided secret.
///
/// # Security
///
/// The secret should be:
/// - At least 32 bytes (256 bits) for HS256
/// - Randomly generated
/// - Stored securely (environment variable or secret manager)
/// - Rotated periodically
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies:
/// - Signature is valid
/// - Token hasn't expired
/// - Issuer is "forgeboard"
/// - Token is not used before nbf time
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&["forgeboard"]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
                expected: "forgeboard".to_string(),
                actual: "unknown".to_string(),
            },
            _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
        }
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();

        let claims = Claims::new(user_id, UserRole::Developer);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "forgeboard");
        assert_eq!(claims.role, UserRole::Developer);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_session_length_follows_role() {
        let admin = Claims::new(Uuid::new_v4(), UserRole::Admin);
        let client = Claims::new(Uuid::new_v4(), UserRole::Client);

        let admin_left = admin.time_until_expiration().unwrap();
        let client_left = client.time_until_expiration().unwrap();

        assert!(admin_left.num_hours() <= 8);
        assert!(admin_left.num_hours() >= 7);
        assert!(client_left.num_days() >= 6);
        assert!(client_left.num_days() <= 7);
    }

    #[test]
    fn test_claims_with_custom_expiration() {
        let claims = Claims::with_expiration(Uuid::new_v4(), UserRole::Client, Duration::hours(1));

        let time_left = claims.time_until_expiration().unwrap();
        assert!(time_left.num_seconds() > 3500); // ~1 hour minus a bit
        assert!(time_left.num_seconds() <= 3600); // <= 1 hour
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let secret = "test-secret-key-at-least-32-bytes-long";

        let claims = Claims::new(user_id, UserRole::SuperAdmin);
        let token = create_token(&claims, secret).expect("Should create token");

        let validated = validate_token(&token, secret).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.role, UserRole::SuperAdmin);
        assert_eq!(validated.iss, "forgeboard");
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), UserRole::Client);
        let token = create_token(&claims, "secret1").expect("Should create token");

        let result = validate_token(&token, "wrong-secret");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let secret = "test-secret";

        // Negative duration = already expired
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            UserRole::Developer,
            Duration::seconds(-3600),
        );

        assert!(claims.is_expired());
        assert!(claims.time_until_expiration().is_none());

        let token = create_token(&claims, secret).expect("Should create token");
        let result = validate_token(&token, secret);

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_validate_garbage_token() {
        assert!(validate_token("not.a.token", "secret").is_err());
        assert!(validate_token("", "secret").is_err());
    }
}
