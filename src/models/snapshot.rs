use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::price::Metadata;

/// Discrete price classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Normal,
    Low,
    High,
    CriticalDip,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "NORMAL",
            Status::Low => "LOW",
            Status::High => "HIGH",
            Status::CriticalDip => "CRITICAL_DIP",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NORMAL" => Ok(Status::Normal),
            "LOW" => Ok(Status::Low),
            "HIGH" => Ok(Status::High),
            "CRITICAL_DIP" | "CRITICAL DIP" => Ok(Status::CriticalDip),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Signal engine output for one series, before symbol/timestamp stamping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub price: f64,
    pub change_percent: f64,
    pub status: Status,
    pub is_low: bool,
    pub reasons: Vec<String>,
    pub details: String,
    pub ma20: f64,
    pub min30: f64,
    pub max30: f64,
    pub seven_day_avg: f64,
    pub seven_day_low: f64,
    pub two_fifty_day_low: f64,
    pub two_fifty_day_avg: f64,
    pub metadata: Metadata,
}

/// Persisted point-in-time analysis of one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: String,
    pub price: f64,
    pub change_percent: f64,
    pub status: Status,
    pub is_low: bool,
    pub details: String,
    pub timestamp: DateTime<Utc>,
    pub market_cap: Option<f64>,
    pub volume: Option<i64>,
    pub open_price: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub seven_day_avg: Option<f64>,
    pub seven_day_low: Option<f64>,
    pub two_fifty_day_low: Option<f64>,
    pub two_fifty_day_avg: Option<f64>,
}

impl Snapshot {
    pub fn from_analysis(
        symbol: impl Into<String>,
        analysis: Analysis,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let metadata = analysis.metadata;
        Self {
            symbol: symbol.into(),
            price: analysis.price,
            change_percent: analysis.change_percent,
            status: analysis.status,
            is_low: analysis.is_low,
            details: analysis.details,
            timestamp,
            market_cap: metadata.market_cap,
            volume: metadata.volume,
            open_price: metadata.open_price,
            day_high: metadata.day_high,
            day_low: metadata.day_low,
            fifty_two_week_high: metadata.fifty_two_week_high,
            fifty_two_week_low: metadata.fifty_two_week_low,
            pe_ratio: metadata.pe_ratio,
            seven_day_avg: Some(analysis.seven_day_avg),
            seven_day_low: Some(analysis.seven_day_low),
            two_fifty_day_low: Some(analysis.two_fifty_day_low),
            two_fifty_day_avg: Some(analysis.two_fifty_day_avg),
        }
    }
}
