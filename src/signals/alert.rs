//! Alert decision and the Telegram message formats.

use url::Url;

use crate::models::snapshot::{Snapshot, Status};
use crate::models::stock::StockEntry;

/// A 1-year-low breach worth pushing to the notification channel
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub two_fifty_day_low: f64,
}

pub struct AlertDecision;

impl AlertDecision {
    /// Fires iff the price is at or below its 250-day low.
    ///
    /// Independent of the `CRITICAL_DIP` status, which uses a 5% band.
    pub fn should_alert(snapshot: &Snapshot) -> bool {
        matches!(snapshot.two_fifty_day_low, Some(low) if snapshot.price <= low)
    }

    pub fn evaluate(entry: &StockEntry, snapshot: &Snapshot) -> Option<Alert> {
        if !Self::should_alert(snapshot) {
            return None;
        }
        Some(Alert {
            symbol: snapshot.symbol.clone(),
            name: entry.name.clone(),
            price: snapshot.price,
            two_fifty_day_low: snapshot.two_fifty_day_low?,
        })
    }
}

impl Alert {
    pub fn message(&self, base_url: &str) -> String {
        format!(
            "\u{1F525} <b>GOLDEN OPPORTUNITY: {} ({})</b>\n\n\
             Current Price: \u{20B9}{:.2}\n\
             <b>250-Day Lowest: \u{20B9}{:.2}</b>\n\
             Action: Price has hit a 1-YEAR (250-day) LOW!\n\n\
             <a href='{}'>Investigate Now</a>",
            escape_html(&self.name),
            escape_html(&self.symbol),
            self.price,
            self.two_fifty_day_low,
            dashboard_link(base_url, &self.symbol),
        )
    }
}

/// On-demand report for a single stock, sent regardless of the alert rule
pub fn status_report(entry: &StockEntry, snapshot: &Snapshot, base_url: &str) -> String {
    let emoji = match snapshot.status {
        Status::Normal => "\u{1F7E2}",
        Status::Low => "\u{1F534}",
        Status::High | Status::CriticalDip => "\u{1F535}",
    };
    format!(
        "{} <b>Manual Status Report: {}</b>\n\n\
         Symbol: <code>{}</code>\n\
         Current Price: \u{20B9}{:.2}\n\
         Change: {:+.2}%\n\
         Status: {}\n\
         Note: {}\n\n\
         <a href='{}'>Open Dashboard</a>",
        emoji,
        escape_html(&entry.name),
        escape_html(&entry.symbol),
        snapshot.price,
        snapshot.change_percent,
        snapshot.status,
        escape_html(&snapshot.details),
        dashboard_link(base_url, &entry.symbol),
    )
}

/// Summary of the latest snapshot of every tracked stock, sent at startup
pub fn startup_report(stocks: &[(StockEntry, Option<Snapshot>)]) -> String {
    let mut lines = vec!["\u{1F680} <b>Server Started! Initial Stock Report:</b>\n".to_string()];
    for (entry, latest) in stocks {
        if let Some(snapshot) = latest {
            lines.push(format!(
                "\u{2022} {}: \u{20B9}{:.2} ({:+.2}%)",
                escape_html(&entry.name),
                snapshot.price,
                snapshot.change_percent
            ));
        }
    }
    lines.join("\n")
}

/// Link to the details page of a stock, with the symbol query-encoded
pub fn dashboard_link(base_url: &str, symbol: &str) -> String {
    let base = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };
    match Url::parse(&base).and_then(|url| url.join("static/details.html")) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("symbol", symbol);
            url.to_string()
        }
        Err(_) => format!("{}static/details.html?symbol={}", base, symbol),
    }
}

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
