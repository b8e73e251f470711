//! Synthetic-dollar agent
//!
//! Collateralization of a delta-neutral hedge: long spot plus the short
//! perp leg's PnL and funding, against outstanding synthetic supply.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::core::{backing_ratio, AgentCore};
use super::traits::TokenRiskAgent;
use crate::error::{Result, SentryError};

pub const SYNTHETIC_AGENT_ID: &str = "synthetic";

pub struct SyntheticDollarAgent {
    core: AgentCore,
}

impl SyntheticDollarAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }
}

#[async_trait]
impl TokenRiskAgent for SyntheticDollarAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    async fn read_collateral_ratio(&self) -> Result<Decimal> {
        let core = &self.core;
        let hedge = core
            .fetch("hedge position", core.source().hedge_position(core.token()))
            .await?;
        let net = hedge.net_collateral_usd().ok_or_else(|| {
            SentryError::source_unavailable(core.source().name(), "hedge collateral out of range")
        })?;
        Ok(backing_ratio(net, hedge.liability_usd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FixedMetricSource, HedgePosition, InMemoryObjectStore};
    use crate::agents::thresholds::ThresholdTable;
    use crate::domain::{AlertSeverity, RiskLevel};
    use crate::persistence::SnapshotStore;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn agent(spot: Decimal, pnl: Decimal) -> SyntheticDollarAgent {
        agent_at_price(dec!(1.0), spot, pnl)
    }

    fn agent_at_price(price: Decimal, spot: Decimal, pnl: Decimal) -> SyntheticDollarAgent {
        let source = FixedMetricSource::new()
            .with_price("SUSD", price)
            .with_hedge(
                "SUSD",
                HedgePosition {
                    spot_collateral_usd: spot,
                    short_unrealized_pnl_usd: pnl,
                    accrued_funding_usd: Decimal::ZERO,
                    liability_usd: dec!(1000),
                },
            );
        let snapshots = SnapshotStore::new(Arc::new(InMemoryObjectStore::new()), Duration::hours(2));
        SyntheticDollarAgent::new(AgentCore::new(
            SYNTHETIC_AGENT_ID,
            "SUSD",
            ThresholdTable::DELTA_NEUTRAL,
            Arc::new(source),
            snapshots,
            std::time::Duration::from_millis(500),
        ))
    }

    #[tokio::test]
    async fn test_uses_delta_neutral_bands() {
        // 1.06 is GREEN for reserve-backed tokens but only YELLOW here
        let agent = agent(dec!(1060), Decimal::ZERO);
        let ratio = agent.collateral_ratio().await;
        assert_eq!(agent.core().collateral_level(&ratio), RiskLevel::Yellow);

        let alerts = agent.check_alerts(Utc::now()).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity(), AlertSeverity::Low);
    }

    #[tokio::test]
    async fn test_losing_short_leg_goes_critical_below_par() {
        let agent = agent(dec!(1100), dec!(-110));
        let ratio = agent.collateral_ratio().await;
        assert_eq!(ratio.value, Some(dec!(0.99)));

        let alerts = agent.check_alerts(Utc::now()).await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity(), AlertSeverity::Critical);
    }

    #[tokio::test]
    async fn test_overflowing_hedge_reads_as_unavailable() {
        let agent = agent(Decimal::MAX, Decimal::MAX);
        assert!(matches!(
            agent.read_collateral_ratio().await,
            Err(SentryError::SourceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_extreme_price_alerts_without_overflow() {
        let agent = agent_at_price(Decimal::MAX, dec!(1100), Decimal::ZERO);
        let alerts = agent.check_alerts(Utc::now()).await;
        let peg = alerts
            .iter()
            .find(|a| a.severity() == AlertSeverity::Critical)
            .expect("peg alert");
        assert!(peg.message().contains("peg deviation"));
    }
}
