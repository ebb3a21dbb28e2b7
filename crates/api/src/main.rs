use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use pillwatch_api::app::{create_app, AppState};
use pillwatch_api::config::Config;
use pillwatch_api::jobs::{JobScheduler, NotificationDispatchJob, PoolMetricsJob};
use pillwatch_api::middleware::{init_metrics, logging::init_logging};
use pillwatch_api::services::{sink_from_config, NotificationCenter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging);
    init_metrics()?;

    info!("Starting Pillwatch v{}", env!("CARGO_PKG_VERSION"));

    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config).await?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool).await?;
    info!("Migrations completed");

    let sink = sink_from_config(&config.notifications)?;
    let notifications = Arc::new(NotificationCenter::new(sink));
    let state = AppState::new(config.clone(), pool.clone(), notifications.clone()).await;

    let mut scheduler = JobScheduler::new();
    scheduler.register(NotificationDispatchJob::new(
        notifications,
        config.notifications.dispatch_interval_secs,
    ));
    scheduler.register(PoolMetricsJob::new(pool));
    scheduler.start();

    let radio_task: Option<JoinHandle<()>> = match config.radio.provider.as_str() {
        #[cfg(feature = "bluetooth")]
        "bluetooth" => Some(pillwatch_api::services::radio::spawn_bluetooth_radio(
            state.tracker.clone(),
            Duration::from_secs(config.radio.retry_secs),
        )),
        #[cfg(not(feature = "bluetooth"))]
        "bluetooth" => {
            warn!("Bluetooth radio requested but this build lacks the `bluetooth` feature");
            None
        }
        _ => {
            info!("Waiting for radio bridge on /api/v1/beacons");
            None
        }
    };

    if config.monitor.auto_start {
        state.session.start().await;
    }

    let session = state.session.clone();
    let app = create_app(state);

    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    session.stop().await;
    if let Some(task) = radio_task {
        task.abort();
    }
    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(5)).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
