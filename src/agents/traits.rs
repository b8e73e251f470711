//! TokenRiskAgent trait: one implementation per monitored instrument
//!
//! The governor and the report cycle depend only on this trait. A new
//! instrument supplies its `AgentCore` and the instrument-specific reads;
//! snapshotting, fallback, classification and alerting come from the
//! provided methods.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::core::{peg_gap, AgentCore, Assessment, Metric, MetricReading, SnapshotRefresh};
use super::thresholds::ThresholdTable;
use crate::domain::{AgentReport, Alert};
use crate::error::Result;

#[async_trait]
pub trait TokenRiskAgent: Send + Sync {
    fn core(&self) -> &AgentCore;

    /// Whether the instrument targets $1.00. Unpegged instruments report a
    /// zero peg deviation.
    fn pegged(&self) -> bool {
        true
    }

    /// Fresh collateral / reserve ratio from the metric source.
    async fn read_collateral_ratio(&self) -> Result<Decimal>;

    /// Fresh observed unit price.
    async fn read_price(&self) -> Result<Decimal> {
        let core = self.core();
        core.fetch("unit price", core.source().unit_price(core.token()))
            .await
    }

    async fn read_launch_progress(&self) -> Result<Option<Decimal>> {
        Ok(None)
    }

    fn id(&self) -> &str {
        self.core().id()
    }

    fn token(&self) -> &str {
        self.core().token()
    }

    fn thresholds(&self) -> &ThresholdTable {
        self.core().thresholds()
    }

    /// Re-read per-chain supply, diff against the snapshot from 24h ago,
    /// persist and return it. Falls back to the last known snapshot when the
    /// source is down.
    async fn refresh_snapshot(&self, now: DateTime<Utc>) -> Result<SnapshotRefresh> {
        self.core().refresh_snapshot(now).await
    }

    async fn price(&self) -> MetricReading {
        let fresh = self.read_price().await;
        self.core().settle(Metric::Price, fresh).await
    }

    /// `|price - 1.00|`, derived from the price reading.
    async fn peg_deviation(&self) -> MetricReading {
        if !self.pegged() {
            return MetricReading::fresh(Decimal::ZERO);
        }
        let price = self.price().await;
        MetricReading {
            value: price.value.map(peg_gap),
            stale: price.stale,
        }
    }

    async fn collateral_ratio(&self) -> MetricReading {
        let fresh = self.read_collateral_ratio().await;
        self.core().settle(Metric::CollateralRatio, fresh).await
    }

    /// One pass over every metric; each source value is read once.
    async fn assess(&self) -> Assessment {
        let price = self.price().await;
        let peg_deviation = if self.pegged() {
            MetricReading {
                value: price.value.map(peg_gap),
                stale: price.stale,
            }
        } else {
            MetricReading::fresh(Decimal::ZERO)
        };
        let collateral_ratio = self.collateral_ratio().await;
        let launch_progress = self.read_launch_progress().await.ok().flatten();

        Assessment {
            price,
            peg_deviation,
            collateral_ratio,
            launch_progress,
        }
    }

    /// Alerts for the current metrics; none for GREEN metrics.
    async fn check_alerts(&self, now: DateTime<Utc>) -> Vec<Alert> {
        let assessment = self.assess().await;
        self.core().alerts_for(&assessment, now)
    }

    /// Snapshot, derived metrics and alert count. Safe to call repeatedly.
    async fn generate_report(&self, now: DateTime<Utc>) -> AgentReport {
        let assessment = self.assess().await;
        self.core().report(&assessment, now).await
    }
}
