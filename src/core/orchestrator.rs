//! Refresh orchestrator: fetch, analyze, alert and persist every tracked stock

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::{RefreshConfig, DEFAULT_BASE_URL};
use crate::core::market_hours::MarketHours;
use crate::db::StockStore;
use crate::error::{DataError, NotifyError, RefreshError};
use crate::metrics::Metrics;
use crate::models::price::{Metadata, PriceSeries};
use crate::models::snapshot::Snapshot;
use crate::models::stock::StockEntry;
use crate::services::market_data::{MarketDataProvider, SERIES_RANGE};
use crate::services::notifier::Notifier;
use crate::signals::alert::AlertDecision;
use crate::signals::engine::SignalEngine;

/// Counts for one completed pass. `alerts` counts alerts actually delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub alerts: usize,
    pub failed_symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    Completed(RefreshSummary),
    /// Scheduled pass outside trading hours
    MarketClosed,
    /// Another pass holds the run lock
    AlreadyRunning,
}

struct SymbolRefresh {
    snapshot: Snapshot,
    alert_sent: bool,
}

pub struct RefreshOrchestrator {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<dyn StockStore>,
    notifier: Arc<dyn Notifier>,
    metrics: Option<Arc<Metrics>>,
    market_hours: MarketHours,
    config: RefreshConfig,
    base_url: String,
    run_lock: Mutex<()>,
}

impl RefreshOrchestrator {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn StockStore>,
        notifier: Arc<dyn Notifier>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            provider,
            store,
            notifier,
            metrics: None,
            market_hours: MarketHours::default(),
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_market_hours(mut self, market_hours: MarketHours) -> Self {
        self.market_hours = market_hours;
        self
    }

    /// Dashboard URL used for links in alert messages
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Metadata is optional, so it gets half the series budget
    fn metadata_timeout(&self) -> Duration {
        self.config.fetch_timeout / 2
    }

    /// Whether a pass currently holds the run lock
    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Timer-driven pass; skipped entirely outside trading hours
    pub async fn run_scheduled(&self, now: DateTime<Utc>) -> PassOutcome {
        if !self.market_hours.is_open_at(now) {
            info!("Market is closed. Skipping update.");
            if let Some(ref metrics) = self.metrics {
                metrics.refresh_passes_skipped_total.inc();
            }
            return PassOutcome::MarketClosed;
        }
        self.run_pass().await
    }

    /// Manually triggered pass; bypasses the market-hours gate
    pub async fn run_forced(&self) -> PassOutcome {
        self.run_pass().await
    }

    async fn run_pass(&self) -> PassOutcome {
        let Ok(_guard) = self.run_lock.try_lock() else {
            info!("Refresh pass already running, skipping");
            if let Some(ref metrics) = self.metrics {
                metrics.refresh_passes_skipped_total.inc();
            }
            return PassOutcome::AlreadyRunning;
        };

        let start = Instant::now();
        let entries = match self.store.list_stock_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "Failed to load stock registry, skipping pass");
                return PassOutcome::Completed(RefreshSummary::default());
            }
        };

        info!(symbol_count = entries.len(), "Refresh pass started for {} stocks", entries.len());

        let results: Vec<(String, Result<SymbolRefresh, RefreshError>)> = stream::iter(entries)
            .map(|entry| async move {
                let result = self.refresh_symbol(&entry).await;
                (entry.symbol, result)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut summary = RefreshSummary {
            processed: results.len(),
            ..RefreshSummary::default()
        };
        for (symbol, result) in results {
            match result {
                Ok(refresh) => {
                    summary.succeeded += 1;
                    if refresh.alert_sent {
                        summary.alerts += 1;
                    }
                    debug!(
                        symbol = %symbol,
                        status = %refresh.snapshot.status,
                        "Stored snapshot for {}",
                        symbol
                    );
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Refresh failed for {}", symbol);
                    summary.failed += 1;
                    summary.failed_symbols.push(symbol);
                }
            }
        }

        if let Some(ref metrics) = self.metrics {
            metrics.refresh_passes_total.inc();
            metrics
                .refresh_symbol_failures_total
                .inc_by(summary.failed as u64);
            metrics
                .refresh_pass_duration_seconds
                .observe(start.elapsed().as_secs_f64());
        }

        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            alerts = summary.alerts,
            duration_ms = start.elapsed().as_millis() as u64,
            "All stocks updated"
        );

        PassOutcome::Completed(summary)
    }

    async fn refresh_symbol(&self, entry: &StockEntry) -> Result<SymbolRefresh, RefreshError> {
        let symbol = entry.symbol.as_str();
        debug!(symbol = %symbol, "Analyzing {}", symbol);

        let (series, metadata) = self.fetch_inputs(symbol).await?;

        let analysis = SignalEngine::evaluate(&series, metadata.as_ref()).ok_or_else(|| {
            DataError::EmptySeries {
                symbol: symbol.to_string(),
            }
        })?;
        let snapshot = Snapshot::from_analysis(symbol, analysis, Utc::now());

        info!(
            symbol = %symbol,
            price = snapshot.price,
            status = %snapshot.status,
            is_low = snapshot.is_low,
            "Got data for {}: {:.2} ({})",
            symbol,
            snapshot.price,
            snapshot.status
        );

        let alert_sent = match AlertDecision::evaluate(entry, &snapshot) {
            Some(alert) => {
                info!(
                    symbol = %symbol,
                    price = alert.price,
                    two_fifty_day_low = alert.two_fifty_day_low,
                    "Price at or below 250-day low"
                );
                self.deliver(symbol, &alert.message(&self.base_url)).await
            }
            None => false,
        };

        self.store.append_snapshot(&snapshot).await?;

        Ok(SymbolRefresh {
            snapshot,
            alert_sent,
        })
    }

    /// Series is required and bounded by `fetch_timeout`; metadata has its own
    /// shorter bound and degrades to absent on failure or timeout.
    async fn fetch_inputs(
        &self,
        symbol: &str,
    ) -> Result<(PriceSeries, Option<Metadata>), RefreshError> {
        let fetch_timeout = self.config.fetch_timeout;
        let metadata_timeout = self.metadata_timeout();
        let (series, metadata) = tokio::join!(
            timeout(fetch_timeout, self.provider.fetch_series(symbol, SERIES_RANGE)),
            timeout(metadata_timeout, self.provider.fetch_metadata(symbol))
        );

        let series = series.map_err(|_| RefreshError::Timeout(fetch_timeout))??;
        if series.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: symbol.to_string(),
            }
            .into());
        }

        let metadata = match metadata {
            Ok(Ok(metadata)) => Some(metadata),
            Ok(Err(e)) => {
                warn!(
                    symbol = %symbol,
                    provider = self.provider.name(),
                    error = %e,
                    "Metadata unavailable for {}",
                    symbol
                );
                None
            }
            Err(_) => {
                warn!(
                    symbol = %symbol,
                    timeout_ms = metadata_timeout.as_millis() as u64,
                    "Metadata timed out for {}",
                    symbol
                );
                None
            }
        };

        Ok((series, metadata))
    }

    /// Best-effort delivery; failures are logged and never propagate.
    /// Returns whether the message was sent.
    async fn deliver(&self, symbol: &str, message: &str) -> bool {
        match send_bounded(self.notifier.as_ref(), message, self.config.fetch_timeout).await {
            Ok(()) => {
                if let Some(ref metrics) = self.metrics {
                    metrics.alerts_sent_total.inc();
                }
                true
            }
            Err(NotifyError::NotConfigured) => {
                debug!(symbol = %symbol, "Notifications disabled, alert not sent");
                false
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Failed to deliver alert for {}", symbol);
                if let Some(ref metrics) = self.metrics {
                    metrics.notification_failures_total.inc();
                }
                false
            }
        }
    }
}

/// Send through `notifier`, giving up after `limit`
pub async fn send_bounded(
    notifier: &dyn Notifier,
    message: &str,
    limit: Duration,
) -> Result<(), NotifyError> {
    match timeout(limit, notifier.send(message)).await {
        Ok(result) => result,
        Err(_) => Err(NotifyError::Transport(format!(
            "delivery timed out after {:?}",
            limit
        ))),
    }
}
