//! Telegram bot notifications
//!
//! Sends plain-text messages through the Bot API `sendMessage` method.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::chat::{truncate_message, ChatTransport};
use crate::error::NotifyError;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const MAX_MESSAGE_CHARS: usize = 4096;

/// Telegram Bot API client
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: Option<String>,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(bot_token: Option<String>) -> Self {
        let bot_token = bot_token.filter(|t| !t.trim().is_empty());
        if bot_token.is_some() {
            info!("Telegram notifications enabled");
        }
        Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token,
        }
    }

    /// Override the API base URL (self-hosted Bot API server).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ChatTransport for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn is_configured(&self) -> bool {
        self.bot_token.is_some()
    }

    async fn send_text(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
        let Some(token) = self.bot_token.as_deref() else {
            return Err(NotifyError::NotConfigured("telegram bot token".to_string()));
        };

        let text = truncate_message(text, MAX_MESSAGE_CHARS);
        let url = format!("{}/bot{}/sendMessage", self.api_base, token);
        let body = SendMessage {
            chat_id: destination,
            text: &text,
            disable_web_page_preview: true,
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the URL, which embeds the bot token.
                NotifyError::Request(e.without_url().to_string())
            })?;

        let status = resp.status();
        let raw = resp.text().await.unwrap_or_default();
        let parsed: Option<ApiResponse> = serde_json::from_str(&raw).ok();

        match parsed {
            Some(api) if status.is_success() && api.ok => {
                debug!("Telegram message sent to {}", destination);
                Ok(())
            }
            other => {
                let body = other
                    .and_then(|api| api.description)
                    .unwrap_or(raw);
                error!("Telegram send failed: {} - {}", status, body);
                Err(NotifyError::Rejected {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
