//! Process-local store used without a database and in tests

use std::collections::HashMap;
use tokio::sync::RwLock;

use super::StockStore;
use crate::error::StoreError;
use crate::models::snapshot::Snapshot;
use crate::models::stock::StockEntry;

#[derive(Default)]
struct Inner {
    entries: Vec<StockEntry>,
    snapshots: HashMap<String, Vec<Snapshot>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StockStore for MemoryStore {
    async fn upsert_stock_entry(&self, entry: &StockEntry) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.entries.iter().any(|e| e.symbol == entry.symbol) {
            return Ok(false);
        }
        inner.entries.push(entry.clone());
        Ok(true)
    }

    async fn list_stock_entries(&self) -> Result<Vec<StockEntry>, StoreError> {
        Ok(self.inner.read().await.entries.clone())
    }

    async fn get_stock_entry(&self, symbol: &str) -> Result<Option<StockEntry>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.entries.iter().find(|e| e.symbol == symbol).cloned())
    }

    async fn append_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.entries.iter().any(|e| e.symbol == snapshot.symbol) {
            return Err(StoreError::UnknownSymbol {
                symbol: snapshot.symbol.clone(),
            });
        }
        inner
            .snapshots
            .entry(snapshot.symbol.clone())
            .or_default()
            .push(snapshot.clone());
        Ok(())
    }

    async fn latest_snapshot(&self, symbol: &str) -> Result<Option<Snapshot>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .snapshots
            .get(symbol)
            .and_then(|history| history.iter().max_by(|a, b| a.timestamp.cmp(&b.timestamp)))
            .cloned())
    }

    async fn list_snapshots(
        &self,
        symbol: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Snapshot>, StoreError> {
        let inner = self.inner.read().await;
        let mut history = inner.snapshots.get(symbol).cloned().unwrap_or_default();
        // Stable sort keeps append order among equal timestamps
        history.reverse();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            history.truncate(limit);
        }
        Ok(history)
    }
}
