//! Cron-based scheduler that drives periodic refresh passes

use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::orchestrator::{PassOutcome, RefreshOrchestrator};
use crate::error::SchedulerError;

/// Convert a fixed interval into a six-field cron expression
/// (second minute hour day month weekday).
///
/// `*/N` restarts at every wrap of its field, so the step must divide the
/// field evenly: seconds and minutes by 60, hours by 24. Intervals that
/// would tick raggedly (45 s, 45 min, 5 h) are rejected.
pub fn interval_to_cron(interval_seconds: u64) -> Result<String, SchedulerError> {
    match interval_seconds {
        0 => Err(SchedulerError::ZeroInterval),
        s if s < 60 && 60 % s == 0 => Ok(format!("*/{} * * * * *", s)),
        s if s < 3600 && s % 60 == 0 && 60 % (s / 60) == 0 => {
            Ok(format!("0 */{} * * * *", s / 60))
        }
        s if s < 86_400 && s % 3600 == 0 && 24 % (s / 3600) == 0 => {
            Ok(format!("0 0 */{} * * *", s / 3600))
        }
        86_400 => Ok("0 0 0 * * *".to_string()),
        s => Err(SchedulerError::UnsupportedInterval(s)),
    }
}

/// Scheduler that periodically asks the orchestrator for a gated refresh pass
pub struct RefreshScheduler {
    orchestrator: Arc<RefreshOrchestrator>,
    schedule: Schedule,
    cron_expr: String,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl RefreshScheduler {
    /// Create a new scheduler
    ///
    /// # Arguments
    /// * `orchestrator` - Refresh pipeline invoked on every tick
    /// * `interval_seconds` - Refresh interval in seconds (0 is rejected)
    pub fn new(
        orchestrator: Arc<RefreshOrchestrator>,
        interval_seconds: u64,
    ) -> Result<Self, SchedulerError> {
        let cron_expr = interval_to_cron(interval_seconds)?;

        let schedule =
            Schedule::from_str(&cron_expr).map_err(|e| SchedulerError::InvalidCron {
                expression: cron_expr.clone(),
                message: e.to_string(),
            })?;

        info!(
            interval = interval_seconds,
            cron = %cron_expr,
            "RefreshScheduler: created with interval {}s (cron: {})",
            interval_seconds,
            cron_expr
        );

        Ok(Self {
            orchestrator,
            schedule,
            cron_expr,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub fn cron_expression(&self) -> &str {
        &self.cron_expr
    }

    /// Start the scheduler. Calling it while already running is a no-op.
    pub async fn start(&self) {
        let mut guard = self.handle.write().await;
        if guard.is_some() {
            debug!("RefreshScheduler: already running");
            return;
        }

        let orchestrator = self.orchestrator.clone();
        let schedule = self.schedule.clone();

        let handle = tokio::spawn(async move {
            info!("RefreshScheduler: started, waiting for cron schedule...");

            loop {
                let mut upcoming = schedule.upcoming(chrono::Utc);
                if let Some(next_tick) = upcoming.next() {
                    let now = chrono::Utc::now();
                    if next_tick > now {
                        let duration = (next_tick - now).to_std().unwrap_or_default();
                        tokio::time::sleep(duration).await;
                    }
                } else {
                    tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                    continue;
                }

                match orchestrator.run_scheduled(chrono::Utc::now()).await {
                    PassOutcome::Completed(summary) => {
                        debug!(
                            succeeded = summary.succeeded,
                            failed = summary.failed,
                            "RefreshScheduler: tick completed"
                        );
                    }
                    PassOutcome::MarketClosed => {
                        debug!("RefreshScheduler: market closed, tick skipped");
                    }
                    PassOutcome::AlreadyRunning => {
                        debug!("RefreshScheduler: previous pass still running, tick skipped");
                    }
                }
            }
        });

        *guard = Some(handle);
        info!("RefreshScheduler: started successfully");
    }

    /// Stop the scheduler
    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("RefreshScheduler: stopped");
        }
    }

    /// Check if the scheduler is running
    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.is_some()
    }
}
