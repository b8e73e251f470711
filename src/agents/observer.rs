//! Observer agent: ecosystem intelligence, no risk category.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::warn;

use crate::adapters::IntelligenceFeed;
use crate::domain::ObserverReport;

pub const OBSERVER_AGENT_ID: &str = "observer";

pub struct ObserverAgent {
    feed: Arc<dyn IntelligenceFeed>,
    lookback: Duration,
    timeout: std::time::Duration,
}

impl ObserverAgent {
    pub fn new(
        feed: Arc<dyn IntelligenceFeed>,
        lookback: Duration,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            feed,
            lookback,
            timeout,
        }
    }

    /// Signals from the last lookback window. A failing feed yields an
    /// empty, stale report.
    pub async fn generate_report(&self, now: DateTime<Utc>) -> ObserverReport {
        let since = now - self.lookback;
        let (signals, stale) =
            match tokio::time::timeout(self.timeout, self.feed.signals_since(since)).await {
                Ok(Ok(signals)) => (signals, false),
                Ok(Err(e)) => {
                    warn!("[{}] {} feed failed: {}", OBSERVER_AGENT_ID, self.feed.name(), e);
                    (Vec::new(), true)
                }
                Err(_) => {
                    warn!("[{}] {} feed timed out", OBSERVER_AGENT_ID, self.feed.name());
                    (Vec::new(), true)
                }
            };

        ObserverReport {
            generated_at: now,
            signals,
            stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::PlaceholderFeed;
    use crate::domain::IntelSignal;
    use crate::error::{Result, SentryError};
    use async_trait::async_trait;

    struct BrokenFeed;

    #[async_trait]
    impl IntelligenceFeed for BrokenFeed {
        fn name(&self) -> &str {
            "broken"
        }

        async fn signals_since(&self, _since: DateTime<Utc>) -> Result<Vec<IntelSignal>> {
            Err(SentryError::source_unavailable("broken", "503"))
        }
    }

    #[tokio::test]
    async fn test_placeholder_feed_is_fresh_and_empty() {
        let observer = ObserverAgent::new(
            Arc::new(PlaceholderFeed),
            Duration::hours(4),
            std::time::Duration::from_millis(100),
        );
        let report = observer.generate_report(Utc::now()).await;
        assert!(report.signals.is_empty());
        assert!(!report.stale);
    }

    #[tokio::test]
    async fn test_failing_feed_is_stale() {
        let observer = ObserverAgent::new(
            Arc::new(BrokenFeed),
            Duration::hours(4),
            std::time::Duration::from_millis(100),
        );
        assert!(observer.generate_report(Utc::now()).await.stale);
    }
}
