/// Database layer for Forgeboard
///
/// This module provides connection pooling and migrations. Models live in
/// the `models` module at crate root level.
///
/// The pool is constructed explicitly at startup and passed down to
/// handlers; there is no global client. Shutdown closes the pool via
/// [`pool::close_pool`].

pub mod migrations;
pub mod pool;

pub use migrations::{get_migration_status, run_migrations, MigrationStatus};
pub use pool::{close_pool, create_pool, health_check, DatabaseConfig};
