use std::sync::Arc;

use anyhow::{Context, Result};
use domain::services::TriviaService;
use eventops_api::{app, config, jobs, middleware, services::EmailNotifier};
use persistence::PgEventStore;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    middleware::init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting Event Ops API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;
    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;

    let store = Arc::new(PgEventStore::new(pool.clone()));
    let seeded = TriviaService::new(store.clone()).seed_default_questions().await?;
    if seeded > 0 {
        info!(count = seeded, "Default trivia questions inserted");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pool_job = jobs::spawn_pool_metrics(pool.clone(), jobs::POOL_METRICS_INTERVAL, shutdown_rx);

    let notifier = Arc::new(EmailNotifier::new(config.notifications.clone()));
    let addr = config.socket_addr().context("Invalid server host/port")?;
    let app = app::create_app(config, store, notifier);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    let _ = pool_job.await;
    pool.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
