//! Trading-session gate for scheduled refreshes

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Utc, Weekday};

/// IST is a fixed UTC+05:30 with no daylight saving
pub const IST_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// Trading session configuration (defaults: NSE, 09:00-15:30 IST, Mon-Fri)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketHours {
    pub utc_offset_seconds: i32,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            utc_offset_seconds: IST_OFFSET_SECONDS,
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl MarketHours {
    /// Open iff a weekday and local time within `[open, close]`, both inclusive.
    /// No holiday calendar.
    pub fn is_open_at(&self, instant: DateTime<Utc>) -> bool {
        let Some(offset) = FixedOffset::east_opt(self.utc_offset_seconds) else {
            tracing::warn!(
                offset = self.utc_offset_seconds,
                "Invalid market UTC offset, treating market as closed"
            );
            return false;
        };
        let local = instant.with_timezone(&offset);

        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }

        let time = local.time();
        self.open <= time && time <= self.close
    }
}

/// Check whether the default market is open at `instant`
pub fn is_market_open(instant: DateTime<Utc>) -> bool {
    MarketHours::default().is_open_at(instant)
}
