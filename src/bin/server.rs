//! Stockwatch Server
//!
//! Serves the HTTP API and dashboard, and runs the scheduled refresh
//! passes in the same process.

use dotenvy::dotenv;
use stockwatch::config::AppConfig;
use stockwatch::core::http::{start_server, AppState};
use stockwatch::core::scheduler::RefreshScheduler;
use stockwatch::core::Services;
use stockwatch::logging;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let config = AppConfig::from_env();
    logging::init_logging(&config);

    info!("Starting Stockwatch Server");
    info!(environment = %config.environment, "Environment");
    info!(addr = %config.bind_addr(), "HTTP Server: http://{}", config.bind_addr());
    info!(
        interval = config.refresh.interval_seconds,
        "Refresh: every {} seconds during market hours",
        config.refresh.interval_seconds
    );

    let services = Services::build(&config).await?;

    if config.startup_report {
        services.send_startup_report().await;
    }

    let scheduler = RefreshScheduler::new(
        services.orchestrator.clone(),
        config.refresh.interval_seconds,
    )?;
    scheduler.start().await;

    let state = AppState::new(
        services.metrics.clone(),
        services.store.clone(),
        services.orchestrator.clone(),
        services.provider.clone(),
        services.notifier.clone(),
    )
    .with_base_url(config.base_url.clone())
    .with_static_dir(config.static_dir.clone());

    let addr = config.bind_addr();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(state, &addr).await {
            error!(error = %e, "HTTP server error");
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    scheduler.stop().await;
    Ok(())
}
