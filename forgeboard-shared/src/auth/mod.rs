/// Authentication and authorization primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength policy
/// - [`jwt`]: Session token generation and validation
/// - [`reset`]: Password-reset token generation and at-rest hashing
/// - [`access`]: The authorization engine, one ordered rule chain shared
///   by every endpoint
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Session Tokens**: HS256 signing with per-role expiry
/// - **Reset Tokens**: High-entropy random values, SHA-256 hashed at rest

pub mod access;
pub mod jwt;
pub mod password;
pub mod reset;
