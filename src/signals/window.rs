//! Trailing-window statistics over closes.
//!
//! Every window shrinks to whatever history exists, so only an empty
//! input yields `None`.

/// The last `period` values, or all of them when fewer exist
pub fn tail(values: &[f64], period: usize) -> &[f64] {
    &values[values.len().saturating_sub(period)..]
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Simple moving average of the trailing window
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    mean(tail(values, period))
}

/// Percent change between the last two values; `0.0` without a usable previous close
pub fn change_percent(values: &[f64]) -> f64 {
    match values {
        [.., prev, current] if *prev != 0.0 => (current - prev) / prev * 100.0,
        _ => 0.0,
    }
}
