//! Discord bot notifications
//!
//! Posts plain-text messages to a channel with a bot token.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, info};

use super::chat::{truncate_message, ChatTransport};
use crate::error::NotifyError;

const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
const MAX_MESSAGE_CHARS: usize = 2000;

/// Discord REST client
#[derive(Clone)]
pub struct DiscordNotifier {
    client: Client,
    api_base: String,
    bot_token: Option<String>,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
}

impl DiscordNotifier {
    pub fn new(bot_token: Option<String>) -> Self {
        let bot_token = bot_token.filter(|t| !t.trim().is_empty());
        if bot_token.is_some() {
            info!("Discord notifications enabled");
        }
        Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token,
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl ChatTransport for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn is_configured(&self) -> bool {
        self.bot_token.is_some()
    }

    async fn send_text(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
        let Some(token) = self.bot_token.as_deref() else {
            return Err(NotifyError::NotConfigured("discord bot token".to_string()));
        };

        let text = truncate_message(text, MAX_MESSAGE_CHARS);
        let url = format!("{}/channels/{}/messages", self.api_base, destination);

        match self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {token}"))
            .json(&CreateMessage { content: &text })
            .send()
            .await
        {
            Ok(resp) => {
                if resp.status().is_success() {
                    debug!("Discord message sent to channel {}", destination);
                    Ok(())
                } else {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    error!("Discord send failed: {} - {}", status, body);
                    Err(NotifyError::Rejected {
                        status: status.as_u16(),
                        body,
                    })
                }
            }
            Err(e) => {
                error!("Discord request failed: {}", e);
                Err(NotifyError::Request(e.to_string()))
            }
        }
    }
}
