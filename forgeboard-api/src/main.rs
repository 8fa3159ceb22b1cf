//! # Forgeboard API Server
//!
//! The HTTP entry point for Forgeboard, a multi-role project management
//! backend: invite-gated registration, project and task tracking, time
//! logging, notifications, activity audit, and reporting.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p forgeboard-api
//! ```

use forgeboard_api::{app, config::Config};
use forgeboard_shared::db;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forgeboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Forgeboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = db::create_pool(db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    db::run_migrations(&pool).await?;

    let bind_address = config.bind_address();
    let state = app::AppState::new(pool.clone(), config);
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing database pool...");
    db::close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
}
