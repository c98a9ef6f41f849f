//! Environment-driven configuration
//!
//! Binaries load `.env` through dotenvy first, then call [`AppConfig::from_env`].
//! Every numeric value falls back to its default when missing or unparseable.

use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;
/// Fifteen minutes keeps the Yahoo endpoints well under their throttling limits.
pub const DEFAULT_REFRESH_INTERVAL_SECONDS: u64 = 900;
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 20;
pub const DEFAULT_REFRESH_CONCURRENCY: usize = 4;
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshConfig {
    pub interval_seconds: u64,
    pub fetch_timeout: Duration,
    pub concurrency: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_REFRESH_INTERVAL_SECONDS,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
            concurrency: DEFAULT_REFRESH_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub environment: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub refresh: RefreshConfig,
    /// `None` when either the bot token or the chat id is missing
    pub telegram: Option<TelegramConfig>,
    pub yahoo_base_url: String,
    /// Public URL of the dashboard, used for links inside alert messages
    pub base_url: String,
    pub static_dir: String,
    pub seed_watchlist: bool,
    pub startup_report: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "sandbox".to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            refresh: RefreshConfig::default(),
            telegram: None,
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            seed_watchlist: true,
            startup_report: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig {
                bot_token,
                chat_id,
                api_url: get("TELEGRAM_API_URL")
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            }),
            _ => None,
        };

        let fetch_timeout_secs = get("FETCH_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECONDS);

        Self {
            environment: get("APP_ENV").unwrap_or(defaults.environment),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: get("DATABASE_URL"),
            refresh: RefreshConfig {
                interval_seconds: get("REFRESH_INTERVAL_SECONDS")
                    .and_then(|i| i.parse::<u64>().ok())
                    .filter(|i| *i > 0)
                    .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECONDS),
                fetch_timeout: Duration::from_secs(fetch_timeout_secs),
                concurrency: get("REFRESH_CONCURRENCY")
                    .and_then(|c| c.parse::<usize>().ok())
                    .filter(|c| *c > 0)
                    .unwrap_or(DEFAULT_REFRESH_CONCURRENCY),
            },
            telegram,
            yahoo_base_url: get("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            base_url: get("BASE_URL").unwrap_or(defaults.base_url),
            static_dir: get("STATIC_DIR").unwrap_or(defaults.static_dir),
            seed_watchlist: get("SEED_WATCHLIST")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.seed_watchlist),
            startup_report: get("STARTUP_REPORT")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.startup_report),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
