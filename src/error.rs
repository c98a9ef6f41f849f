//! Error types for the collaborators around the signal engine.
//!
//! The engine itself never fails on degenerate input; these cover the
//! market-data source, storage, the notification channel and the per-symbol
//! refresh step that ties them together.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no price history returned for {symbol}")]
    EmptySeries { symbol: String },

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("provider returned HTTP {status}")]
    Http { status: u16 },

    #[error("request timed out")]
    Timeout,
}

impl DataError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            DataError::Network(_) | DataError::RateLimited | DataError::Timeout => true,
            DataError::Http { status } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataError::Timeout
        } else if err.is_decode() {
            DataError::ResponseFormat(err.to_string())
        } else if let Some(status) = err.status() {
            DataError::Http {
                status: status.as_u16(),
            }
        } else {
            DataError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("no stock entry registered for {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("migration {version} failed: {message}")]
    Migration { version: i32, message: String },
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel is not configured")]
    NotConfigured,

    #[error("failed to reach notification channel: {0}")]
    Transport(String),

    #[error("notification rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

/// Failure of a single symbol's refresh; never aborts the whole pass
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("refresh interval must be greater than zero")]
    ZeroInterval,

    #[error("refresh interval of {0}s cannot be expressed as a cron schedule")]
    UnsupportedInterval(u64),

    #[error("invalid cron expression '{expression}': {message}")]
    InvalidCron { expression: String, message: String },
}
