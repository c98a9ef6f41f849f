//! Main signal evaluation engine: window statistics plus the
//! "relatively low" classification.

use crate::models::price::{Metadata, PriceSeries};
use crate::models::snapshot::{Analysis, Status};
use crate::signals::window;

pub const MA_PERIOD: usize = 20;
pub const SHORT_PERIOD: usize = 7;
pub const RANGE_PERIOD: usize = 30;
/// Roughly one trading year
pub const YEAR_PERIOD: usize = 250;

/// Fraction of the 30-day range counted as its bottom band
pub const BOTTOM_BAND: f64 = 0.20;
/// Drop from the 30-day high (percent) that counts as a dip
pub const DROP_FROM_HIGH_PCT: f64 = 15.0;
/// Distance above the 250-day low that still counts as a critical dip
pub const CRITICAL_DIP_FACTOR: f64 = 1.05;
/// Share of the 30-day high at which a stock is considered near its high
pub const NEAR_HIGH_FACTOR: f64 = 0.98;

pub const NORMAL_DETAILS: &str = "Normal price action";

pub struct SignalEngine;

impl SignalEngine {
    /// Analyze a price series. Returns `None` only when the series is empty.
    pub fn evaluate(series: &PriceSeries, metadata: Option<&Metadata>) -> Option<Analysis> {
        Self::evaluate_closes(&series.closes(), metadata)
    }

    pub fn evaluate_closes(closes: &[f64], metadata: Option<&Metadata>) -> Option<Analysis> {
        let price = *closes.last()?;

        let ma20 = window::sma(closes, MA_PERIOD)?;

        let last7 = window::tail(closes, SHORT_PERIOD);
        let seven_day_avg = window::mean(last7)?;
        let seven_day_low = window::min(last7)?;

        let year = window::tail(closes, YEAR_PERIOD);
        let two_fifty_day_low = window::min(year)?;
        let two_fifty_day_avg = window::mean(year)?;

        let last30 = window::tail(closes, RANGE_PERIOD);
        let min30 = window::min(last30)?;
        let max30 = window::max(last30)?;

        let change_percent = window::change_percent(closes);

        let mut reasons = Vec::new();
        let mut is_low = false;

        if price <= ma20 {
            reasons.push(format!("Below 20-day MA ({:.2})", ma20));
            is_low = true;
        }

        let bottom_threshold = min30 + (max30 - min30) * BOTTOM_BAND;
        if price <= bottom_threshold {
            reasons.push(format!(
                "In bottom 20% of 30-day range (Low: {:.2})",
                min30
            ));
            is_low = true;
        }

        // A non-positive high makes the drop undefined
        if max30 > 0.0 {
            let drop_pct = (max30 - price) / max30 * 100.0;
            if drop_pct >= DROP_FROM_HIGH_PCT {
                reasons.push(format!(
                    "Dropped {:.1}% from 30-day high ({:.2})",
                    drop_pct, max30
                ));
                is_low = true;
            }
        }

        // Reported only; the status rule below carries the classification
        if price <= two_fifty_day_low {
            reasons.push(format!("At/Below 250-day low ({:.2})", two_fifty_day_low));
        }

        let status = if two_fifty_day_low > 0.0 && price <= two_fifty_day_low * CRITICAL_DIP_FACTOR
        {
            is_low = true;
            Status::CriticalDip
        } else if is_low {
            Status::Low
        } else if max30 > 0.0 && price >= max30 * NEAR_HIGH_FACTOR {
            Status::High
        } else {
            Status::Normal
        };

        let details = if reasons.is_empty() {
            NORMAL_DETAILS.to_string()
        } else {
            reasons.join(", ")
        };

        Some(Analysis {
            price,
            change_percent,
            status,
            is_low,
            reasons,
            details,
            ma20,
            min30,
            max30,
            seven_day_avg,
            seven_day_low,
            two_fifty_day_low,
            two_fifty_day_avg,
            metadata: metadata.cloned().unwrap_or_default(),
        })
    }
}
