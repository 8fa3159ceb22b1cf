/// Password reset token utilities
///
/// This module generates and hashes the single-use tokens handed out by the
/// forgot-password flow. Database state for them lives in
/// `models::password_reset`.
///
/// # Security
///
/// - **Format**: 48 random alphanumeric chars (base62: [A-Za-z0-9])
/// - **Storage**: Tokens are hashed with SHA-256 before storage; the
///   plaintext exists only in the reset email
/// - **Lookup**: Consumption queries by digest equality, so no plaintext
///   comparison ever happens server-side
/// - **Lifetime**: 30 minutes, enforced at the database layer
///
/// # Example
///
/// ```
/// use forgeboard_shared::auth::reset::{generate_reset_token, hash_reset_token, validate_reset_token_format};
///
/// let (token, hash) = generate_reset_token();
/// assert_eq!(token.len(), 48);
/// assert!(validate_reset_token_format(&token));
///
/// let computed_hash = hash_reset_token(&token);
/// assert_eq!(hash, computed_hash);
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a reset token (characters)
pub const RESET_TOKEN_LENGTH: usize = 48;

/// Generates a new password reset token
///
/// Creates a cryptographically random 48-char base62 token and returns
/// it together with the SHA-256 hash for database storage.
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hash)
///
/// # Security
///
/// - Uses `rand::thread_rng()` for cryptographic randomness
/// - Token space: 62^48 combinations
/// - Hash prevents plaintext storage
pub fn generate_reset_token() -> (String, String) {
    let token = generate_random_string(RESET_TOKEN_LENGTH);
    let hash = hash_reset_token(&token);

    (token, hash)
}

/// Generates a random alphanumeric string
///
/// Uses base62 encoding (A-Z, a-z, 0-9) for URL-safe tokens.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Hashes a reset token using SHA-256
///
/// # Returns
///
/// Hex-encoded SHA-256 hash (64 characters)
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validates reset token format
///
/// Checks length and that the token contains only alphanumeric
/// characters. Malformed tokens are rejected before any database lookup.
pub fn validate_reset_token_format(token: &str) -> bool {
    token.len() == RESET_TOKEN_LENGTH && token.chars().all(|c| c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reset_token() {
        let (token1, hash1) = generate_reset_token();
        let (token2, hash2) = generate_reset_token();

        assert_eq!(token1.len(), RESET_TOKEN_LENGTH);
        assert!(token1.chars().all(|c| c.is_alphanumeric()));

        // Check randomness
        assert_ne!(token1, token2);
        assert_ne!(hash1, hash2);

        // Check hash length
        assert_eq!(hash1.len(), 64); // SHA-256 hex
    }

    #[test]
    fn test_hash_reset_token() {
        let hash = hash_reset_token("some-token");

        assert_eq!(hash.len(), 64);

        // Deterministic
        assert_eq!(hash, hash_reset_token("some-token"));

        // Different token = different hash
        assert_ne!(hash, hash_reset_token("other-token"));
    }

    #[test]
    fn test_validate_reset_token_format() {
        let (token, _) = generate_reset_token();
        assert!(validate_reset_token_format(&token));

        // Too short
        assert!(!validate_reset_token_format("abc123"));

        // Right length, bad characters
        let bad = format!("{}!", "a".repeat(RESET_TOKEN_LENGTH - 1));
        assert!(!validate_reset_token_format(&bad));

        // Empty
        assert!(!validate_reset_token_format(""));
    }

}
