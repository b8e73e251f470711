//! Ecosystem intelligence feed
//!
//! Social/agent-network signals consumed by the observer. No production
//! feed exists yet; `PlaceholderFeed` returns no signals.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::IntelSignal;
use crate::error::Result;

#[async_trait]
pub trait IntelligenceFeed: Send + Sync {
    fn name(&self) -> &str;

    /// Signals observed since `since`.
    async fn signals_since(&self, since: DateTime<Utc>) -> Result<Vec<IntelSignal>>;
}

/// Not yet implemented: always an empty signal list.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderFeed;

#[async_trait]
impl IntelligenceFeed for PlaceholderFeed {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn signals_since(&self, _since: DateTime<Utc>) -> Result<Vec<IntelSignal>> {
        Ok(Vec::new())
    }
}
