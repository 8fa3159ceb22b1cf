/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login, password reset, self-service
/// - `admin`: User administration, invite codes, activity log, stats
/// - `dashboards`: Per-caller client and developer overviews
/// - `projects`: Project CRUD and membership
/// - `tasks`: Task CRUD, assignment, time logs, comments
/// - `notifications`: Per-user notification management
/// - `contact`: Public intake and admin review
/// - `settings`: Admin-gated key/value settings
/// - `reports`: Read-only aggregations

use axum::http::HeaderMap;

pub mod admin;
pub mod auth;
pub mod contact;
pub mod dashboards;
pub mod health;
pub mod notifications;
pub mod projects;
pub mod reports;
pub mod settings;
pub mod tasks;

/// Best-effort client IP for rate-limit keys
///
/// Honors the forwarding headers set by the reverse proxy; the value is
/// only a rate-limit identity, never an authorization input.
pub(crate) fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.1.2.3, 172.16.0.1".parse().unwrap());
        headers.insert("x-real-ip", "10.9.9.9".parse().unwrap());

        assert_eq!(client_ip(&headers), "10.1.2.3");
    }

    #[test]
    fn test_client_ip_fallbacks() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.9.9.9".parse().unwrap());
        assert_eq!(client_ip(&headers), "10.9.9.9");

        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}
