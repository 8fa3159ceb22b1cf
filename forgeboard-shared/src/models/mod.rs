/// Database models for Forgeboard
///
/// One module per table, each with its row struct, create/update inputs,
/// and sqlx CRUD operations.
///
/// # Models
///
/// - `user`: Accounts, roles, and permission grants
/// - `invite_code`: Single-use, role-bound registration codes
/// - `project`: Client-owned projects with members
/// - `task`: Project tasks with assignee and priority
/// - `time_log`: Immutable per-task time entries
/// - `comment`: Immutable per-task comments
/// - `activity_log`: Append-only audit records
/// - `notification`: Per-user inbox entries
/// - `password_reset`: Single-use, time-boxed reset tokens (hashed at rest)
/// - `contact`: Contact-form intake
/// - `setting`: System configuration key/value store

pub mod activity_log;
pub mod comment;
pub mod contact;
pub mod invite_code;
pub mod notification;
pub mod password_reset;
pub mod project;
pub mod setting;
pub mod task;
pub mod time_log;
pub mod user;
