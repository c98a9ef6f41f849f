use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Daily closes for one symbol, ascending by timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    /// Build a series from bare closes, one day apart, ending today
    pub fn from_closes(symbol: impl Into<String>, closes: &[f64]) -> Self {
        let now = Utc::now();
        let count = closes.len() as i64;
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                timestamp: now - chrono::Duration::days(count - 1 - i as i64),
                close,
            })
            .collect();
        Self::new(symbol, points)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Descriptive quote fields; providers may return any subset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub market_cap: Option<f64>,
    pub volume: Option<i64>,
    pub open_price: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub pe_ratio: Option<f64>,
}

/// Intraday or daily close used for charting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Exchange-local time formatted as `YYYY-MM-DD HH:MM`
    pub date: String,
    pub close: f64,
}
