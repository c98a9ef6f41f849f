//! Shared data models spanning the engine layers.

pub mod price;
pub mod snapshot;
pub mod stock;

pub use price::{ChartPoint, Metadata, PricePoint, PriceSeries};
pub use snapshot::{Analysis, Snapshot, Status};
pub use stock::StockEntry;
