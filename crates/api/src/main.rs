use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use survey_api::app::{build_router, AppState};
use survey_api::config::Config;
use survey_api::jobs::spawn_maintenance;
use survey_api::middleware::{init_metrics, logging::init_logging};
use survey_api::services::admin_bootstrap::bootstrap_admin;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.logging);
    info!("Starting Survey Portal API v{}", env!("CARGO_PKG_VERSION"));

    init_metrics().context("Failed to install Prometheus recorder")?;

    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    bootstrap_admin(&pool, &config.admin).await?;

    let addr = config.socket_addr()?;
    let state = AppState::new(config, pool.clone());
    if state.jwt.is_none() {
        warn!("JWT keys missing or invalid; admin login will answer 503");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let maintenance = spawn_maintenance(pool, state.rate_limiter.clone(), shutdown_rx);

    let app = build_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(true);
    if tokio::time::timeout(Duration::from_secs(5), maintenance)
        .await
        .is_err()
    {
        warn!("Maintenance task did not stop in time");
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
