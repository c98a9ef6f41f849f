//! Push-notification channel

pub mod telegram;

pub use telegram::TelegramNotifier;

use std::sync::Arc;

use crate::config::TelegramConfig;
use crate::error::NotifyError;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one formatted message. Best-effort, never retried.
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

/// Stand-in used when no channel credentials are configured
pub struct DisabledNotifier;

#[async_trait::async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, _message: &str) -> Result<(), NotifyError> {
        Err(NotifyError::NotConfigured)
    }
}

/// Telegram when configured, otherwise a notifier that reports `NotConfigured`
pub fn from_config(config: Option<&TelegramConfig>) -> Arc<dyn Notifier> {
    match config {
        Some(telegram) => Arc::new(TelegramNotifier::new(telegram.clone())),
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID not set - notifications disabled");
            Arc::new(DisabledNotifier)
        }
    }
}
