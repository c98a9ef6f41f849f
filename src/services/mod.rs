//! External collaborators: market data and notifications.

pub mod market_data;
pub mod notifier;
pub mod yahoo;
