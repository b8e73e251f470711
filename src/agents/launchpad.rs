//! Bonding-curve launchpad agent
//!
//! The launch token is unpegged. Its "collateral" is the curve reserve
//! against the reserve the curve formula says it should hold.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::core::{backing_ratio, AgentCore};
use super::traits::TokenRiskAgent;
use crate::adapters::CurveState;
use crate::error::{Result, SentryError};

pub const LAUNCHPAD_AGENT_ID: &str = "launchpad";

pub struct LaunchpadAgent {
    core: AgentCore,
}

impl LaunchpadAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }

    async fn curve(&self) -> Result<CurveState> {
        let core = &self.core;
        core.fetch("curve state", core.source().curve_state(core.token()))
            .await
    }

    fn out_of_range(&self, what: &str) -> SentryError {
        SentryError::source_unavailable(
            self.core.source().name(),
            format!("curve {what} out of range"),
        )
    }
}

/// Fraction of the graduation supply sold, capped at 1.
pub fn launch_progress(curve: &CurveState) -> Decimal {
    if curve.graduation_supply <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    curve
        .tokens_sold
        .checked_div(curve.graduation_supply)
        .unwrap_or(Decimal::ONE)
        .min(Decimal::ONE)
        .max(Decimal::ZERO)
}

#[async_trait]
impl TokenRiskAgent for LaunchpadAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn pegged(&self) -> bool {
        false
    }

    async fn read_price(&self) -> Result<Decimal> {
        let price = self.curve().await?.spot_price();
        price.ok_or_else(|| self.out_of_range("spot price"))
    }

    async fn read_collateral_ratio(&self) -> Result<Decimal> {
        let curve = self.curve().await?;
        let expected = curve
            .expected_reserve()
            .ok_or_else(|| self.out_of_range("expected reserve"))?;
        Ok(backing_ratio(curve.reserve_balance, expected))
    }

    async fn read_launch_progress(&self) -> Result<Option<Decimal>> {
        Ok(Some(launch_progress(&self.curve().await?)))
    }
}
