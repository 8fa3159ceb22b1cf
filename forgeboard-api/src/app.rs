/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use forgeboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = forgeboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, mailer::Mailer, middleware::rate_limit::RateLimiter,
    middleware::security::SecurityHeadersLayer};
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use forgeboard_shared::auth::{access::Caller, jwt};
use forgeboard_shared::models::user::User;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound email client
    pub mailer: Mailer,

    /// Login attempt limiter, keyed by email + IP
    pub login_limiter: Arc<RateLimiter>,

    /// Forgot-password endpoint limiter, keyed by IP; the per-user
    /// issuance cap is enforced against stored tokens in the handler
    pub reset_limiter: Arc<RateLimiter>,

    /// Contact form limiter, keyed by IP
    pub contact_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let mailer = Mailer::new(&config.mailer);
        let limits = config.rate_limits;

        Self {
            db,
            config: Arc::new(config),
            mailer,
            login_limiter: Arc::new(RateLimiter::new(
                limits.login.max_requests,
                Duration::from_secs(limits.login.window_secs),
            )),
            reset_limiter: Arc::new(RateLimiter::new(
                limits.reset.max_requests,
                Duration::from_secs(limits.reset.window_secs),
            )),
            contact_limiter: Arc::new(RateLimiter::new(
                limits.contact.max_requests,
                Duration::from_secs(limits.contact.window_secs),
            )),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                     # Health check (public)
/// └── /v1/
///     ├── /auth/                  # Signup, login, password reset, self-service
///     ├── /admin/                 # User administration, invites, activity, stats
///     ├── /clients/dashboard      # Caller's projects overview
///     ├── /dev/dashboard          # Caller's assigned tasks overview
///     ├── /projects/              # Project CRUD + members
///     ├── /tasks/                 # Task CRUD + time logs + comments
///     ├── /notifications/         # Per-user notifications
///     ├── /reports/               # Read-only aggregations
///     ├── /settings/              # Admin-gated key/value settings
///     └── /contact                # Public intake + admin review
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Compression
/// 4. Security headers
/// 5. Authentication (per-group basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes: signup/login/reset are public, the rest require a session
    let auth_public = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    let auth_private = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/profile", put(routes::auth::update_profile))
        .route("/password", put(routes::auth::change_password))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let admin_routes = Router::new()
        .route("/users", get(routes::admin::list_users))
        .route("/users/:id", get(routes::admin::get_user))
        .route("/users/:id/approve", post(routes::admin::approve_user))
        .route("/users/:id/reject", post(routes::admin::reject_user))
        .route("/users/:id/role", put(routes::admin::set_user_role))
        .route(
            "/users/:id/permissions",
            put(routes::admin::set_user_permissions),
        )
        .route(
            "/users/:id/deactivate",
            post(routes::admin::deactivate_user),
        )
        .route("/users/:id", delete(routes::admin::delete_user))
        .route("/invites", post(routes::admin::create_invite))
        .route("/invites", get(routes::admin::list_invites))
        .route("/invites/:id", delete(routes::admin::revoke_invite))
        .route("/activity", get(routes::admin::list_activity))
        .route("/stats", get(routes::admin::stats));

    let dashboard_routes = Router::new()
        .route(
            "/clients/dashboard",
            get(routes::dashboards::client_dashboard),
        )
        .route("/dev/dashboard", get(routes::dashboards::dev_dashboard));

    let project_routes = Router::new()
        .route("/", post(routes::projects::create_project))
        .route("/", get(routes::projects::list_projects))
        .route("/:id", get(routes::projects::get_project))
        .route("/:id", put(routes::projects::update_project))
        .route("/:id", delete(routes::projects::delete_project))
        .route("/:id/members", post(routes::projects::add_member))
        .route("/:id/members", get(routes::projects::list_members))
        .route(
            "/:id/members/:user_id",
            delete(routes::projects::remove_member),
        );

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/", get(routes::tasks::list_tasks))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/assign", post(routes::tasks::assign_task))
        .route("/:id/status", put(routes::tasks::set_task_status))
        .route("/:id/time-logs", post(routes::tasks::log_time))
        .route("/:id/time-logs", get(routes::tasks::list_time_logs))
        .route("/:id/comments", post(routes::tasks::add_comment))
        .route("/:id/comments", get(routes::tasks::list_comments));

    let notification_routes = Router::new()
        .route("/", get(routes::notifications::list_notifications))
        .route("/unread-count", get(routes::notifications::unread_count))
        .route("/:id/read", post(routes::notifications::mark_read))
        .route("/read-all", post(routes::notifications::mark_all_read))
        .route("/:id", delete(routes::notifications::delete_notification));

    let report_routes = Router::new()
        .route("/overview", get(routes::reports::overview))
        .route("/revenue", get(routes::reports::revenue))
        .route("/time", get(routes::reports::time_totals));

    let settings_routes = Router::new()
        .route("/", get(routes::settings::list_settings))
        .route("/:key", get(routes::settings::get_setting))
        .route("/:key", put(routes::settings::put_setting));

    // Contact intake is public; review endpoints are authenticated
    let contact_public = Router::new().route("/", post(routes::contact::submit));
    let contact_private = Router::new()
        .route("/", get(routes::contact::list_messages))
        .route("/:id/status", put(routes::contact::set_status))
        .route("/:id", delete(routes::contact::delete_message))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Everything behind a session token
    let authenticated = Router::new()
        .nest("/admin", admin_routes)
        .merge(dashboard_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/notifications", notification_routes)
        .nest("/reports", report_routes)
        .nest("/settings", settings_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_private))
        .nest("/contact", contact_public.merge(contact_private))
        .merge(authenticated);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, reloads the user row, and injects a
/// [`Caller`] into request extensions. Role and permission changes made
/// since the token was issued take effect here, on the next request.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    use crate::error::ApiError;

    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    // The user row is authoritative; the token only proves identity
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }
    if user.is_approved != Some(true) {
        return Err(ApiError::PendingApproval);
    }

    req.extensions_mut().insert(Caller::from_user(&user));

    Ok(next.run(req).await)
}
