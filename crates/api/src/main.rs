use anyhow::Result;
use std::time::Duration;
use tracing::info;

mod app;
mod config;
mod error;
mod jobs;
mod middleware;
mod routes;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);

    info!(
        "Starting Entitlement Admin API v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Create database pool
    let pool = persistence::db::create_pool(&config.pool_settings()).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // Start background jobs (order sync, quota reset, pool metrics)
    let mut scheduler = jobs::JobScheduler::new();
    if config.scheduler.enabled {
        scheduler.register(jobs::OrderSyncJob::new(
            pool.clone(),
            config.scheduler.order_sync_hour,
            config.scheduler.sync_max_retries,
        ));
        scheduler.register(jobs::QuotaResetJob::new(
            pool.clone(),
            config.scheduler.quota_reset_hour,
        ));
        scheduler.register(jobs::PoolMetricsJob::new(pool.clone()));
    }
    let job_status = scheduler.status_handle();
    scheduler.start();

    // Build application
    let app = app::create_app(config.clone(), pool, job_status);

    // Start server
    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop jobs after the HTTP server drains: finish the in-flight run,
    // schedule nothing further.
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(30)).await;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    info!("Shutdown signal received");
}
