//! Telegram Bot API notifier

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::Notifier;
use crate::config::TelegramConfig;
use crate::error::NotifyError;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: TelegramConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token
        )
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let payload = SendMessageRequest {
            chat_id: &self.config.chat_id,
            text: message,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(chat_id = %self.config.chat_id, "Telegram message delivered");
        Ok(())
    }
}
