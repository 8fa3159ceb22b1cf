//! # Forgeboard Shared Library
//!
//! Shared types and business logic used by the Forgeboard API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, session tokens, reset tokens, and the
//!   authorization engine
//! - `audit`: Activity logging and post-commit side effects
//! - `db`: Connection pool lifecycle and migrations

pub mod audit;
pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Forgeboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
