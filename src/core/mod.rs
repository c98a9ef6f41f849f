//! Core application primitives (market gate, refresh pipeline, scheduling, HTTP)

pub mod bootstrap;
pub mod http;
pub mod market_hours;
pub mod orchestrator;
pub mod scheduler;

pub use bootstrap::Services;
pub use http::{create_router, start_server, AppState};
pub use market_hours::{is_market_open, MarketHours};
pub use orchestrator::{PassOutcome, RefreshOrchestrator, RefreshSummary};
pub use scheduler::{interval_to_cron, RefreshScheduler};
