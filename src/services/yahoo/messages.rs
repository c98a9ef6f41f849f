//! Yahoo Finance response payloads

use serde::Deserialize;

use crate::models::price::Metadata;

/// v8 chart API response
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartData>>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub meta: Option<ChartMeta>,
    #[serde(default)]
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub regular_market_price: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_volume: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    /// Exchange offset from UTC in seconds
    pub gmtoffset: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteData {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

/// v7 quote API response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub quote_response: QuoteEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct QuoteEnvelope {
    #[serde(default)]
    pub result: Vec<QuoteSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub market_cap: Option<f64>,
    pub regular_market_volume: Option<f64>,
    pub regular_market_open: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<f64>,
}

impl From<QuoteSummary> for Metadata {
    fn from(quote: QuoteSummary) -> Self {
        Metadata {
            market_cap: quote.market_cap,
            volume: quote.regular_market_volume.map(|v| v as i64),
            open_price: quote.regular_market_open,
            day_high: quote.regular_market_day_high,
            day_low: quote.regular_market_day_low,
            fifty_two_week_high: quote.fifty_two_week_high,
            fifty_two_week_low: quote.fifty_two_week_low,
            pe_ratio: quote.trailing_pe,
        }
    }
}

impl From<ChartMeta> for Metadata {
    fn from(meta: ChartMeta) -> Self {
        Metadata {
            market_cap: None,
            volume: meta.regular_market_volume.map(|v| v as i64),
            open_price: None,
            day_high: meta.regular_market_day_high,
            day_low: meta.regular_market_day_low,
            fifty_two_week_high: meta.fifty_two_week_high,
            fifty_two_week_low: meta.fifty_two_week_low,
            pe_ratio: None,
        }
    }
}
