use crate::config::TelegramConfig;
use crate::sources::AlertTransport;
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";
const SEND_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Telegram bot alert transport. Messages are sent as HTML.
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Self {
        let client = Client::builder()
            .user_agent("WhaleRadar/1.0")
            .timeout(Duration::from_secs(SEND_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: TELEGRAM_API_URL.to_string(),
            config,
        }
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.base_url, self.config.token)
    }
}

#[async_trait]
impl AlertTransport for TelegramNotifier {
    async fn send(&self, message: &str) -> anyhow::Result<()> {
        let body = SendMessage {
            chat_id: &self.config.chat_id,
            text: message,
            parse_mode: "HTML",
        };

        let response = self.client.post(self.send_url()).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Telegram API returned {}", response.status()));
        }

        Ok(())
    }
}

/// Transport used when no chat destination is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledTransport;

#[async_trait]
impl AlertTransport for DisabledTransport {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn send(&self, _message: &str) -> anyhow::Result<()> {
        debug!("Alert transport disabled, dropping message");
        Ok(())
    }
}
