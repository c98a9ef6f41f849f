//! stockwatch: polls daily prices for a watchlist, flags relatively cheap
//! stocks, persists snapshots and pushes Telegram alerts.

pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
