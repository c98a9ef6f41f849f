//! Stockwatch Worker
//!
//! Runs the scheduled refresh passes without the HTTP API. Can be run as a
//! separate process from the web server when both share `DATABASE_URL`.
//! With `RUN_ONCE=1` it performs a single forced pass and exits.

use dotenvy::dotenv;
use std::env;
use stockwatch::config::AppConfig;
use stockwatch::core::orchestrator::PassOutcome;
use stockwatch::core::scheduler::RefreshScheduler;
use stockwatch::core::Services;
use stockwatch::logging;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let config = AppConfig::from_env();
    logging::init_logging(&config);

    info!("Starting Stockwatch Worker");
    info!(environment = %config.environment, "Environment");

    if config.database_url.is_none() {
        warn!("Worker without DATABASE_URL keeps snapshots in memory only");
    }

    let services = Services::build(&config).await?;

    let run_once = env::var("RUN_ONCE")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    if run_once {
        info!("Running a single forced refresh pass");
        match services.orchestrator.run_forced().await {
            PassOutcome::Completed(summary) => info!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                alerts = summary.alerts,
                "Refresh pass finished"
            ),
            other => warn!(outcome = ?other, "Refresh pass did not run"),
        }
        return Ok(());
    }

    let scheduler = RefreshScheduler::new(
        services.orchestrator.clone(),
        config.refresh.interval_seconds,
    )?;
    scheduler.start().await;

    info!("Worker started, waiting for shutdown signal...");
    signal::ctrl_c().await?;

    info!("Shutting down worker...");
    scheduler.stop().await;
    info!("Worker stopped");

    Ok(())
}
