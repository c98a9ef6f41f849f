//! Persistence for the stock registry and snapshot history

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::models::snapshot::Snapshot;
use crate::models::stock::StockEntry;

/// Seeded into an empty registry on first start
pub const DEFAULT_WATCHLIST: &[(&str, &str)] = &[
    ("RELIANCE.NS", "Reliance Industries"),
    ("TCS.NS", "Tata Consultancy Services"),
    ("INFY.NS", "Infosys"),
    ("HDFCBANK.NS", "HDFC Bank"),
    ("ICICIBANK.NS", "ICICI Bank"),
    ("SBIN.NS", "State Bank of India"),
    ("ITC.NS", "ITC Ltd"),
    ("LT.NS", "Larsen & Toubro"),
    ("AXISBANK.NS", "Axis Bank"),
    ("WIPRO.NS", "Wipro"),
    ("TATAGOLD.NS", "Tata Gold ETF"),
];

/// Large-cap additions registered by the `add-stocks` binary
pub const EXTENDED_WATCHLIST: &[(&str, &str)] = &[
    ("KOTAKBANK.NS", "Kotak Mahindra Bank"),
    ("HINDUNILVR.NS", "Hindustan Unilever"),
    ("BHARTIARTL.NS", "Bharti Airtel"),
    ("SBIN.NS", "State Bank of India"),
    ("BAJFINANCE.NS", "Bajaj Finance"),
    ("ASIANPAINT.NS", "Asian Paints"),
    ("MARUTI.NS", "Maruti Suzuki"),
    ("TITAN.NS", "Titan Company"),
    ("SUNPHARMA.NS", "Sun Pharma"),
    ("ULTRACEMCO.NS", "UltraTech Cement"),
    ("ADANIENT.NS", "Adani Enterprises"),
    ("ADANIPORTS.NS", "Adani Ports"),
    ("AXISBANK.NS", "Axis Bank"),
    ("M&M.NS", "Mahindra & Mahindra"),
    ("NTPC.NS", "NTPC"),
    ("POWERGRID.NS", "Power Grid"),
    ("TATASTEEL.NS", "Tata Steel"),
    ("TATAMOTORS.NS", "Tata Motors"),
    ("JSWSTEEL.NS", "JSW Steel"),
    ("COALINDIA.NS", "Coal India"),
    ("LICI.NS", "LIC of India"),
    ("ONGC.NS", "ONGC"),
    ("HCLTECH.NS", "HCL Technologies"),
    ("WIPRO.NS", "Wipro"),
    ("GRASIM.NS", "Grasim Industries"),
    ("BAJAJFINSV.NS", "Bajaj Finserv"),
    ("NESTLEIND.NS", "Nestle India"),
    ("INDUSINDBK.NS", "IndusInd Bank"),
    ("HDFCLIFE.NS", "HDFC Life"),
    ("SBILIFE.NS", "SBI Life Insurance"),
    ("BAJAJ-AUTO.NS", "Bajaj Auto"),
    ("DRREDDY.NS", "Dr. Reddy's"),
    ("IOC.NS", "Indian Oil"),
    ("BPCL.NS", "BPCL"),
    ("BRITANNIA.NS", "Britannia Industries"),
    ("TATAGOLD.NS", "Tata Gold ETF"),
];

#[async_trait::async_trait]
pub trait StockStore: Send + Sync {
    /// Register a stock. Returns `false` when the symbol already existed;
    /// existing entries are never modified.
    async fn upsert_stock_entry(&self, entry: &StockEntry) -> Result<bool, StoreError>;

    /// All entries in registry order
    async fn list_stock_entries(&self) -> Result<Vec<StockEntry>, StoreError>;

    async fn get_stock_entry(&self, symbol: &str) -> Result<Option<StockEntry>, StoreError>;

    /// Append a snapshot; fails with `UnknownSymbol` for unregistered symbols
    async fn append_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    async fn latest_snapshot(&self, symbol: &str) -> Result<Option<Snapshot>, StoreError>;

    /// Snapshot history for a symbol, newest first
    async fn list_snapshots(
        &self,
        symbol: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Snapshot>, StoreError>;
}

/// Postgres when `database_url` is set, otherwise a process-local store
pub async fn connect(database_url: Option<&str>) -> Result<Arc<dyn StockStore>, StoreError> {
    match database_url {
        Some(url) => {
            let store = PostgresStore::connect(url).await?;
            info!("Postgres store connected");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set - using in-memory store, snapshots will not survive restarts");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Register every listed stock, skipping existing symbols. Returns how many were added.
pub async fn register_all(
    store: &dyn StockStore,
    stocks: &[(&str, &str)],
) -> Result<usize, StoreError> {
    let mut added = 0;
    for (symbol, name) in stocks {
        if store.upsert_stock_entry(&StockEntry::new(*symbol, *name)).await? {
            info!(symbol = %symbol, "Added {} ({})", name, symbol);
            added += 1;
        }
    }
    Ok(added)
}

/// Seed the default watchlist into an empty registry
pub async fn seed_if_empty(store: &dyn StockStore) -> Result<usize, StoreError> {
    if !store.list_stock_entries().await?.is_empty() {
        info!("Stock registry already seeded");
        return Ok(0);
    }
    info!("Seeding stock registry with {} default stocks", DEFAULT_WATCHLIST.len());
    register_all(store, DEFAULT_WATCHLIST).await
}
