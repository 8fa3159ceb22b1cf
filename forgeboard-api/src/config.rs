/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_CORS_ORIGINS`: Comma-separated allowed origins (default: *)
/// - `API_PRODUCTION`: Enables HSTS and strict CORS (default: false)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 chars (required)
/// - `MAILER_ENDPOINT`: Delivery service URL for outbound email (optional;
///   emails are logged and dropped when unset)
/// - `MAILER_FROM`: From address for outbound email
/// - `RATE_LIMIT_LOGIN_MAX` / `RATE_LIMIT_LOGIN_WINDOW_SECS`: Login attempts
///   per identity per window (default: 10 per 300s)
/// - `RATE_LIMIT_RESET_MAX` / `RATE_LIMIT_RESET_WINDOW_SECS`: Password reset
///   requests per user per window (default: 3 per 3600s)
/// - `RATE_LIMIT_CONTACT_MAX` / `RATE_LIMIT_CONTACT_WINDOW_SECS`: Contact
///   submissions per IP per window (default: 5 per 3600s)
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use forgeboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Outbound email configuration
    pub mailer: MailerConfig,

    /// Rate limit windows
    pub rate_limits: RateLimitConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins ("*" for permissive)
    pub cors_origins: Vec<String>,

    /// Production hardening (HSTS)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Outbound email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    /// Delivery service endpoint; None disables delivery
    pub endpoint: Option<String>,

    /// From address included in delivery requests
    pub from: String,
}

/// One rate-limit window definition
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitWindow {
    /// Maximum requests inside the window
    pub max_requests: u32,

    /// Window length in seconds
    pub window_secs: u64,
}

/// Rate limit windows per guarded surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Login attempts, keyed by email + IP
    pub login: RateLimitWindow,

    /// Password reset requests, keyed by user
    pub reset: RateLimitWindow,

    /// Contact form submissions, keyed by IP
    pub contact: RateLimitWindow,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = env::var("API_CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let production = env::var("API_PRODUCTION")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let mailer_endpoint = env::var("MAILER_ENDPOINT").ok().filter(|s| !s.is_empty());
        let mailer_from =
            env::var("MAILER_FROM").unwrap_or_else(|_| "noreply@forgeboard.dev".to_string());

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            mailer: MailerConfig {
                endpoint: mailer_endpoint,
                from: mailer_from,
            },
            rate_limits: RateLimitConfig {
                login: window_from_env("RATE_LIMIT_LOGIN", 10, 300)?,
                reset: window_from_env("RATE_LIMIT_RESET", 3, 3600)?,
                contact: window_from_env("RATE_LIMIT_CONTACT", 5, 3600)?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn window_from_env(
    prefix: &str,
    default_max: u32,
    default_window: u64,
) -> anyhow::Result<RateLimitWindow> {
    let max_requests = env::var(format!("{}_MAX", prefix))
        .unwrap_or_else(|_| default_max.to_string())
        .parse::<u32>()?;
    let window_secs = env::var(format!("{}_WINDOW_SECS", prefix))
        .unwrap_or_else(|_| default_window.to_string())
        .parse::<u64>()?;

    Ok(RateLimitWindow {
        max_requests,
        window_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            },
            mailer: MailerConfig {
                endpoint: None,
                from: "noreply@forgeboard.dev".to_string(),
            },
            rate_limits: RateLimitConfig {
                login: RateLimitWindow {
                    max_requests: 10,
                    window_secs: 300,
                },
                reset: RateLimitWindow {
                    max_requests: 3,
                    window_secs: 3600,
                },
                contact: RateLimitWindow {
                    max_requests: 5,
                    window_secs: 3600,
                },
            },
        }
    }

    #[test]
    fn test_bind_address() {
        let config = test_config();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_rate_limit_defaults() {
        let config = test_config();
        assert_eq!(config.rate_limits.login.max_requests, 10);
        assert_eq!(config.rate_limits.reset.window_secs, 3600);
    }
}
