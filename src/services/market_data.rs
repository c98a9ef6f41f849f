//! Market data provider interface.

use crate::error::DataError;
use crate::models::price::{ChartPoint, Metadata, PriceSeries};

/// Daily history long enough to cover the 250-day window
pub const SERIES_RANGE: &str = "2y";
/// History used for the on-demand short-window stats
pub const SHORT_WINDOW_RANGE: &str = "7d";

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Daily closes for `symbol` over `range` (e.g. `2y`, `7d`), oldest first
    async fn fetch_series(&self, symbol: &str, range: &str) -> Result<PriceSeries, DataError>;

    /// Descriptive quote fields; may be partial when the provider throttles
    async fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, DataError>;

    /// Chart points for an arbitrary period/interval pair
    async fn fetch_chart(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<ChartPoint>, DataError>;
}
