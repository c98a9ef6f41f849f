//! Wiring shared by the binaries: store, provider, notifier and orchestrator

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::core::orchestrator::RefreshOrchestrator;
use crate::db::{self, StockStore};
use crate::error::NotifyError;
use crate::metrics::Metrics;
use crate::services::market_data::MarketDataProvider;
use crate::services::notifier::{self, Notifier};
use crate::services::yahoo::YahooMarketDataProvider;
use crate::signals::alert::startup_report;

pub struct Services {
    pub metrics: Arc<Metrics>,
    pub store: Arc<dyn StockStore>,
    pub provider: Arc<dyn MarketDataProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub orchestrator: Arc<RefreshOrchestrator>,
}

impl Services {
    /// Connect storage (seeding it when configured) and assemble the refresh pipeline
    pub async fn build(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let metrics = Arc::new(Metrics::new()?);

        let store = db::connect(config.database_url.as_deref()).await?;
        if config.database_url.is_some() {
            metrics.database_connected.set(1.0);
        }
        if config.seed_watchlist {
            let added = db::seed_if_empty(store.as_ref()).await?;
            if added > 0 {
                info!(added = added, "Seeded {} stocks", added);
            }
        }

        let provider: Arc<dyn MarketDataProvider> = Arc::new(YahooMarketDataProvider::new(
            config.yahoo_base_url.clone(),
            config.refresh.fetch_timeout,
        )?);
        info!(provider = provider.name(), "Market data provider ready");
        let notifier = notifier::from_config(config.telegram.as_ref());

        let orchestrator = Arc::new(
            RefreshOrchestrator::new(
                provider.clone(),
                store.clone(),
                notifier.clone(),
                config.refresh.clone(),
            )
            .with_metrics(metrics.clone())
            .with_base_url(config.base_url.clone()),
        );

        Ok(Self {
            metrics,
            store,
            provider,
            notifier,
            orchestrator,
        })
    }

    /// Push the latest snapshot of every tracked stock to the notification channel
    pub async fn send_startup_report(&self) {
        let entries = match self.store.list_stock_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to load stocks for startup report");
                return;
            }
        };

        let mut stocks = Vec::with_capacity(entries.len());
        for entry in entries {
            let latest = match self.store.latest_snapshot(&entry.symbol).await {
                Ok(latest) => latest,
                Err(e) => {
                    warn!(symbol = %entry.symbol, error = %e, "Failed to load latest snapshot");
                    None
                }
            };
            stocks.push((entry, latest));
        }

        match self.notifier.send(&startup_report(&stocks)).await {
            Ok(()) => info!(stock_count = stocks.len(), "Startup report sent"),
            Err(NotifyError::NotConfigured) => {}
            Err(e) => warn!(error = %e, "Error sending startup notification"),
        }
    }
}
