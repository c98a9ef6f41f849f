//! Shared fakes for integration tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stockwatch::config::RefreshConfig;
use stockwatch::core::orchestrator::RefreshOrchestrator;
use stockwatch::db::{MemoryStore, StockStore};
use stockwatch::error::{DataError, NotifyError, StoreError};
use stockwatch::models::price::{ChartPoint, Metadata, PriceSeries};
use stockwatch::models::snapshot::Snapshot;
use stockwatch::models::stock::StockEntry;
use stockwatch::services::market_data::{MarketDataProvider, SHORT_WINDOW_RANGE};
use stockwatch::services::notifier::Notifier;

/// In-process market data keyed by symbol; unknown symbols fail
#[derive(Default)]
pub struct FakeMarketData {
    series: HashMap<String, Vec<f64>>,
    metadata: HashMap<String, Metadata>,
    delay: Option<Duration>,
    metadata_delay: Option<Duration>,
    pub series_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.series.insert(symbol.to_string(), closes.to_vec());
        self
    }

    pub fn with_metadata(mut self, symbol: &str, metadata: Metadata) -> Self {
        self.metadata.insert(symbol.to_string(), metadata);
        self
    }

    /// Delay every series fetch, to hold a pass open
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay every metadata fetch, simulating a hung quote endpoint
    pub fn with_metadata_delay(mut self, delay: Duration) -> Self {
        self.metadata_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for FakeMarketData {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch_series(&self, symbol: &str, range: &str) -> Result<PriceSeries, DataError> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let closes = self
            .series
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        let closes = if range == SHORT_WINDOW_RANGE {
            &closes[closes.len().saturating_sub(7)..]
        } else {
            &closes[..]
        };
        Ok(PriceSeries::from_closes(symbol, closes))
    }

    async fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, DataError> {
        if let Some(delay) = self.metadata_delay {
            tokio::time::sleep(delay).await;
        }
        self.metadata
            .get(symbol)
            .cloned()
            .ok_or(DataError::RateLimited)
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        _period: &str,
        _interval: &str,
    ) -> Result<Vec<ChartPoint>, DataError> {
        let closes = self
            .series
            .get(symbol)
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        Ok(closes
            .iter()
            .enumerate()
            .map(|(i, close)| ChartPoint {
                date: format!("2024-01-03 {:02}:15", 9 + i),
                close: *close,
            })
            .collect())
    }
}

/// Notifier that records every message, optionally failing delivery
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Holds every send for `delay` before succeeding
    pub fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 400,
                body: "chat not found".to_string(),
            });
        }
        Ok(())
    }
}

/// Memory store whose snapshot writes fail for selected symbols
#[allow(dead_code)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing: HashSet<String>,
}

#[allow(dead_code)]
impl FlakyStore {
    pub async fn new(stocks: &[(&str, &str)], failing: &[&str]) -> Self {
        let inner = MemoryStore::new();
        for (symbol, name) in stocks {
            inner
                .upsert_stock_entry(&StockEntry::new(*symbol, *name))
                .await
                .expect("register stock");
        }
        Self {
            inner,
            failing: failing.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait::async_trait]
impl StockStore for FlakyStore {
    async fn upsert_stock_entry(&self, entry: &StockEntry) -> Result<bool, StoreError> {
        self.inner.upsert_stock_entry(entry).await
    }

    async fn list_stock_entries(&self) -> Result<Vec<StockEntry>, StoreError> {
        self.inner.list_stock_entries().await
    }

    async fn get_stock_entry(&self, symbol: &str) -> Result<Option<StockEntry>, StoreError> {
        self.inner.get_stock_entry(symbol).await
    }

    async fn append_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.failing.contains(&snapshot.symbol) {
            return Err(StoreError::Query("disk full".to_string()));
        }
        self.inner.append_snapshot(snapshot).await
    }

    async fn latest_snapshot(&self, symbol: &str) -> Result<Option<Snapshot>, StoreError> {
        self.inner.latest_snapshot(symbol).await
    }

    async fn list_snapshots(
        &self,
        symbol: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Snapshot>, StoreError> {
        self.inner.list_snapshots(symbol, limit).await
    }
}

#[allow(dead_code)]
pub fn test_refresh_config() -> RefreshConfig {
    RefreshConfig {
        interval_seconds: 60,
        fetch_timeout: Duration::from_millis(500),
        concurrency: 2,
    }
}

/// Memory store pre-registered with the given stocks
#[allow(dead_code)]
pub async fn store_with(stocks: &[(&str, &str)]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (symbol, name) in stocks {
        store
            .upsert_stock_entry(&StockEntry::new(*symbol, *name))
            .await
            .expect("register stock");
    }
    store
}

#[allow(dead_code)]
pub fn orchestrator(
    provider: Arc<FakeMarketData>,
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    config: RefreshConfig,
) -> RefreshOrchestrator {
    RefreshOrchestrator::new(provider, store, notifier, config)
}
