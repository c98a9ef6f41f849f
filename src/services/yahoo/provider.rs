//! Yahoo Finance market data provider implementation
//!
//! Daily history and chart data come from the v8 chart API. Descriptive
//! metadata comes from the v7 quote API, which Yahoo throttles or refuses
//! without a session; in that case the provider falls back to the partial
//! metadata carried by the chart response.

use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::messages::{ChartData, ChartResponse, QuoteResponse};
use crate::error::DataError;
use crate::models::price::{ChartPoint, Metadata, PricePoint, PriceSeries};
use crate::services::market_data::MarketDataProvider;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub struct YahooMarketDataProvider {
    base_url: String,
    client: Client,
    backoff: ExponentialBuilder,
}

impl YahooMarketDataProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            backoff: ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(500))
                .with_max_times(2),
        }
    }

    /// Override the retry policy for transient failures
    pub fn with_backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = backoff;
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, DataError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DataError::Network(format!("invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| DataError::Network(format!("base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn chart_url(&self, symbol: &str, range: &str, interval: &str) -> Result<Url, DataError> {
        let mut url = self.endpoint(&["v8", "finance", "chart", symbol])?;
        url.query_pairs_mut()
            .append_pair("range", range)
            .append_pair("interval", interval)
            .append_pair("includePrePost", "false");
        Ok(url)
    }

    fn quote_url(&self, symbol: &str) -> Result<Url, DataError> {
        let mut url = self.endpoint(&["v7", "finance", "quote"])?;
        url.query_pairs_mut().append_pair("symbols", symbol);
        Ok(url)
    }

    /// GET and decode with retry on transient failures
    async fn get_json<T: DeserializeOwned + Send>(&self, url: Url, symbol: &str) -> Result<T, DataError> {
        let request = || {
            let url = url.clone();
            async move { self.get_json_once::<T>(url, symbol).await }
        };

        request
            .retry(self.backoff)
            .when(DataError::is_transient)
            .notify(|err: &DataError, delay: Duration| {
                warn!(
                    symbol = %symbol,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "Yahoo request failed, retrying"
                );
            })
            .await
    }

    async fn get_json_once<T: DeserializeOwned + Send>(&self, url: Url, symbol: &str) -> Result<T, DataError> {
        debug!(symbol = %symbol, url = %url, "Yahoo request");
        let response = self.client.get(url).send().await?;
        let status = response.status();

        match status {
            StatusCode::TOO_MANY_REQUESTS => return Err(DataError::RateLimited),
            StatusCode::NOT_FOUND => {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
            s if !s.is_success() => return Err(DataError::Http { status: s.as_u16() }),
            _ => {}
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DataError::ResponseFormat(format!("failed to decode response for {}: {}", symbol, e)))
    }

    async fn fetch_chart_data(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<ChartData, DataError> {
        let url = self.chart_url(symbol, range, interval)?;
        let response: ChartResponse = self.get_json(url, symbol).await?;
        Self::unwrap_chart(symbol, response)
    }

    fn unwrap_chart(symbol: &str, response: ChartResponse) -> Result<ChartData, DataError> {
        let results = match (response.chart.result, response.chart.error) {
            (Some(results), _) => results,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
            (None, Some(err)) => {
                return Err(DataError::ResponseFormat(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(DataError::ResponseFormat(
                    "empty result with no error".to_string(),
                ))
            }
        };

        results.into_iter().next().ok_or_else(|| DataError::EmptySeries {
            symbol: symbol.to_string(),
        })
    }

    /// Pair timestamps with closes, dropping gaps and non-finite values
    fn observations(data: &ChartData) -> Vec<(i64, f64)> {
        let Some(timestamps) = data.timestamp.as_ref() else {
            return Vec::new();
        };
        let Some(quote) = data.indicators.quote.first() else {
            return Vec::new();
        };

        timestamps
            .iter()
            .zip(quote.close.iter())
            .filter_map(|(&ts, close)| match close {
                Some(close) if close.is_finite() => Some((ts, *close)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooMarketDataProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    async fn fetch_series(&self, symbol: &str, range: &str) -> Result<PriceSeries, DataError> {
        let data = self.fetch_chart_data(symbol, range, "1d").await?;

        let mut points: Vec<PricePoint> = Self::observations(&data)
            .into_iter()
            .filter_map(|(ts, close)| {
                DateTime::<Utc>::from_timestamp(ts, 0).map(|timestamp| PricePoint { timestamp, close })
            })
            .collect();
        points.sort_by_key(|p| p.timestamp);

        if points.is_empty() {
            return Err(DataError::EmptySeries {
                symbol: symbol.to_string(),
            });
        }

        debug!(symbol = %symbol, count = points.len(), "Fetched {} daily closes for {}", points.len(), symbol);
        Ok(PriceSeries::new(symbol, points))
    }

    async fn fetch_metadata(&self, symbol: &str) -> Result<Metadata, DataError> {
        let quote = match self.quote_url(symbol) {
            Ok(url) => self.get_json::<QuoteResponse>(url, symbol).await,
            Err(e) => Err(e),
        };

        match quote {
            Ok(response) => {
                if let Some(summary) = response.quote_response.result.into_iter().next() {
                    return Ok(summary.into());
                }
                debug!(symbol = %symbol, "Quote API returned no result, falling back to chart metadata");
            }
            Err(e) => {
                debug!(symbol = %symbol, error = %e, "Quote API unavailable, falling back to chart metadata");
            }
        }

        let data = self.fetch_chart_data(symbol, "1d", "1d").await?;
        Ok(data.meta.map(Metadata::from).unwrap_or_default())
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<ChartPoint>, DataError> {
        let data = self.fetch_chart_data(symbol, period, interval).await?;
        let offset = data
            .meta
            .as_ref()
            .and_then(|m| m.gmtoffset)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        Ok(Self::observations(&data)
            .into_iter()
            .filter_map(|(ts, close)| {
                DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| ChartPoint {
                    date: dt.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string(),
                    close,
                })
            })
            .collect())
    }
}
