//! Notification dispatcher
//!
//! Delivers one message to every destination bound to a logical channel.
//! Each send is independent: one transport failing or timing out never
//! blocks another, and every attempt yields a `DispatchResult`.

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::alert_router::ChannelId;
use crate::adapters::ChatTransport;
use crate::error::NotifyError;

/// A chat destination serving a logical channel.
#[derive(Clone)]
pub struct ChannelBinding {
    pub channel: ChannelId,
    pub transport: Arc<dyn ChatTransport>,
    /// Chat id / channel id. `None` means not configured.
    pub destination: Option<String>,
}

/// Outcome of one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub channel: ChannelId,
    pub transport: String,
    pub success: bool,
    /// Not attempted because credentials or destination are missing.
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResult {
    fn delivered(channel: ChannelId, transport: &str) -> Self {
        Self {
            channel,
            transport: transport.to_string(),
            success: true,
            skipped: false,
            error: None,
        }
    }

    fn skipped(channel: ChannelId, transport: &str, reason: String) -> Self {
        Self {
            channel,
            transport: transport.to_string(),
            success: false,
            skipped: true,
            error: Some(reason),
        }
    }

    fn failed(channel: ChannelId, transport: &str, err: NotifyError) -> Self {
        Self {
            channel,
            transport: transport.to_string(),
            success: false,
            skipped: false,
            error: Some(err.to_string()),
        }
    }
}

pub struct NotificationDispatcher {
    bindings: Vec<ChannelBinding>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            bindings: Vec::new(),
            timeout,
        }
    }

    pub fn with_binding(
        mut self,
        channel: ChannelId,
        transport: Arc<dyn ChatTransport>,
        destination: Option<String>,
    ) -> Self {
        let destination = destination.filter(|d| !d.trim().is_empty());
        self.bindings.push(ChannelBinding {
            channel,
            transport,
            destination,
        });
        self
    }

    pub fn bindings(&self) -> &[ChannelBinding] {
        &self.bindings
    }

    async fn send_one(&self, binding: &ChannelBinding, message: &str) -> DispatchResult {
        let channel = binding.channel;
        let name = binding.transport.name();

        let destination = match (&binding.destination, binding.transport.is_configured()) {
            (Some(destination), true) => destination,
            (None, _) => {
                debug!("No {} destination for {} channel, skipping", name, channel);
                return DispatchResult::skipped(channel, name, "no destination".to_string());
            }
            (Some(_), false) => {
                debug!("{} not configured, skipping {} channel", name, channel);
                return DispatchResult::skipped(
                    channel,
                    name,
                    NotifyError::NotConfigured(name.to_string()).to_string(),
                );
            }
        };

        let sent = tokio::time::timeout(
            self.timeout,
            binding.transport.send_text(destination, message),
        )
        .await;
        match sent {
            Ok(Ok(())) => {
                info!("Sent {} message via {}", channel, name);
                DispatchResult::delivered(channel, name)
            }
            Ok(Err(e)) => {
                error!("Failed to send {} message via {}: {}", channel, name, e);
                DispatchResult::failed(channel, name, e)
            }
            Err(_) => {
                let e = NotifyError::Timeout {
                    elapsed_ms: self.timeout.as_millis() as u64,
                };
                error!("Failed to send {} message via {}: {}", channel, name, e);
                DispatchResult::failed(channel, name, e)
            }
        }
    }

    /// Send to every destination bound to `channel`.
    ///
    /// A channel with no bindings yields one skipped result.
    pub async fn send(&self, channel: ChannelId, message: &str) -> Vec<DispatchResult> {
        self.broadcast(&[channel], message).await
    }

    /// Send to every destination of every listed channel concurrently.
    pub async fn broadcast(&self, channels: &[ChannelId], message: &str) -> Vec<DispatchResult> {
        let mut results = join_all(
            self.bindings
                .iter()
                .filter(|b| channels.contains(&b.channel))
                .map(|b| self.send_one(b, message)),
        )
        .await;

        for channel in channels {
            if !self.bindings.iter().any(|b| b.channel == *channel) {
                debug!("No binding for {} channel", channel);
                results.push(DispatchResult::skipped(
                    *channel,
                    "none",
                    "no binding".to_string(),
                ));
            }
        }
        results
    }
}
