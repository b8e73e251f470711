//! Chat transport seam shared by the notification backends.

use async_trait::async_trait;

use crate::error::NotifyError;

/// A chat API able to post a plain-text message to a destination
/// (chat id, channel id).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether credentials are present. Unconfigured transports are skipped.
    fn is_configured(&self) -> bool;

    async fn send_text(&self, destination: &str, text: &str) -> Result<(), NotifyError>;
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn truncate_message(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('\u{2026}');
    out
}
