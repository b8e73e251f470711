//! Gold-backed stablecoin agent
//!
//! Collateral is the attested physical reserve against outstanding supply.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::core::{backing_ratio, AgentCore};
use super::traits::TokenRiskAgent;
use crate::error::Result;

pub const GOLD_AGENT_ID: &str = "gold";

pub struct GoldReserveAgent {
    core: AgentCore,
}

impl GoldReserveAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }
}

#[async_trait]
impl TokenRiskAgent for GoldReserveAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn read_collateral_ratio(&self) -> Result<Decimal> {
        let core = &self.core;
        let reserve = core
            .fetch(
                "reserve attestation",
                core.source().reserve_attestation(core.token()),
            )
            .await?;
        Ok(backing_ratio(reserve.reserve_value_usd, reserve.liability_usd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FixedMetricSource, InMemoryObjectStore, ReserveAttestation};
    use crate::agents::thresholds::ThresholdTable;
    use crate::domain::{AlertSeverity, AlertType, RiskLevel};
    use crate::persistence::SnapshotStore;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    const E18: u128 = 1_000_000_000_000_000_000;

    fn source(reserve: Decimal, price: Decimal) -> FixedMetricSource {
        FixedMetricSource::new()
            .with_supplies("GOLD", BTreeMap::from([(1, 600 * E18), (8453, 400 * E18)]))
            .with_price("GOLD", price)
            .with_reserve(
                "GOLD",
                ReserveAttestation {
                    reserve_value_usd: reserve * dec!(1000),
                    liability_usd: dec!(1000),
                },
            )
    }

    fn agent(source: Arc<FixedMetricSource>) -> GoldReserveAgent {
        let snapshots = SnapshotStore::new(Arc::new(InMemoryObjectStore::new()), Duration::hours(2));
        GoldReserveAgent::new(AgentCore::new(
            GOLD_AGENT_ID,
            "GOLD",
            ThresholdTable::STANDARD,
            source,
            snapshots,
            std::time::Duration::from_millis(500),
        ))
    }

    #[tokio::test]
    async fn test_reserve_shortfall_is_one_critical_alert() {
        let agent = agent(Arc::new(source(dec!(0.97), dec!(1.001))));
        let now = Utc::now();

        let ratio = agent.collateral_ratio().await;
        assert_eq!(ratio.value, Some(dec!(0.97)));
        assert_eq!(agent.core().collateral_level(&ratio), RiskLevel::Red);
        let peg = agent.peg_deviation().await;
        assert_eq!(peg.value, Some(dec!(0.001)));
        assert_eq!(agent.core().peg_level(&peg), RiskLevel::Green);

        let alerts = agent.check_alerts(now).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity(), AlertSeverity::Critical);
        assert_eq!(alerts[0].alert_type(), AlertType::Collateral);
        assert_eq!(alerts[0].source(), GOLD_AGENT_ID);
    }

    #[tokio::test]
    async fn test_healthy_metrics_emit_nothing() {
        let agent = agent(Arc::new(source(dec!(1.06), dec!(0.997))));
        assert!(agent.check_alerts(Utc::now()).await.is_empty());

        let report = agent.generate_report(Utc::now()).await;
        assert_eq!(report.alert_count, 0);
        assert_eq!(report.collateral_risk, RiskLevel::Green);
        assert_eq!(report.peg_risk, RiskLevel::Green);
        assert!(!report.stale);
    }

    #[tokio::test]
    async fn test_depeg_beyond_five_percent_is_critical() {
        let agent = agent(Arc::new(source(dec!(1.06), dec!(0.94))));
        let alerts = agent.check_alerts(Utc::now()).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type(), AlertType::Peg);
        assert_eq!(alerts[0].severity(), AlertSeverity::Critical);
    }

    #[tokio::test]
    async fn test_outage_falls_back_to_last_known() {
        let source = Arc::new(source(dec!(1.03), dec!(1.0)));
        let agent = agent(source.clone());
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();

        let first = agent.refresh_snapshot(t0).await.unwrap();
        assert!(!first.stale);
        assert_eq!(agent.generate_report(t0).await.alert_count, 1);

        source.set_offline(true);
        let t1 = t0 + Duration::hours(4);
        let refresh = agent.refresh_snapshot(t1).await.unwrap();
        assert!(refresh.stale);
        assert_eq!(refresh.snapshot, first.snapshot);

        let report = agent.generate_report(t1).await;
        assert!(report.stale);
        assert_eq!(report.metrics.collateral_ratio, dec!(1.03));
        assert_eq!(report.collateral_risk, RiskLevel::Yellow);

        let alerts = agent.check_alerts(t1).await;
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().any(|a| a.alert_type() == AlertType::StaleData
            && a.severity() == AlertSeverity::Warning));
    }

    #[tokio::test]
    async fn test_outage_without_history_is_an_error() {
        let source = Arc::new(source(dec!(1.06), dec!(1.0)));
        source.set_offline(true);
        let agent = agent(source);
        assert!(agent.refresh_snapshot(Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_refresh_diffs_against_day_old_snapshot_and_is_idempotent() {
        let agent = agent(Arc::new(source(dec!(1.06), dec!(1.0))));
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        agent.refresh_snapshot(t0).await.unwrap();

        let t1 = t0 + Duration::hours(24);
        let a = agent.refresh_snapshot(t1).await.unwrap();
        let b = agent.refresh_snapshot(t1).await.unwrap();
        assert_eq!(a.snapshot, b.snapshot);
        assert!(a.storage_error.is_none());
        assert!(b.storage_error.is_none());
        assert_eq!(a.snapshot.total, 1000 * E18);
        assert_eq!(a.snapshot.total_change_24h, 0);
    }
}
