//! Upstream metric sources (chain RPC, price oracle, reserve attestations)
//!
//! Agents only see the [`MetricSource`] trait. Real RPC integrations are not
//! wired yet; [`FixedMetricSource`] serves configured constant readings until
//! they are.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, SentryError};

/// Physical reserve backing a gold-backed token, valued in USD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveAttestation {
    pub reserve_value_usd: Decimal,
    /// Outstanding liability in USD at the $1.00 target.
    pub liability_usd: Decimal,
}

/// Delta-neutral hedge backing a synthetic dollar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgePosition {
    /// Long spot collateral, USD.
    pub spot_collateral_usd: Decimal,
    /// Unrealized PnL of the short perp leg, USD (negative when underwater).
    pub short_unrealized_pnl_usd: Decimal,
    /// Funding accrued to the short leg, USD.
    pub accrued_funding_usd: Decimal,
    /// Outstanding synthetic supply, USD.
    pub liability_usd: Decimal,
}

impl HedgePosition {
    /// `None` when the legs overflow a Decimal.
    pub fn net_collateral_usd(&self) -> Option<Decimal> {
        self.spot_collateral_usd
            .checked_add(self.short_unrealized_pnl_usd)?
            .checked_add(self.accrued_funding_usd)
    }
}

/// Linear bonding curve `price(s) = base_price + slope * s`, `s` in whole tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveState {
    pub tokens_sold: Decimal,
    pub graduation_supply: Decimal,
    pub reserve_balance: Decimal,
    pub base_price: Decimal,
    pub slope: Decimal,
}

impl CurveState {
    /// Reserve the curve should hold after `tokens_sold`. `None` on overflow.
    pub fn expected_reserve(&self) -> Option<Decimal> {
        let s = self.tokens_sold;
        let linear = self.base_price.checked_mul(s)?;
        let quadratic = self.slope.checked_mul(s)?.checked_mul(s)?.checked_div(dec!(2))?;
        linear.checked_add(quadratic)
    }

    pub fn spot_price(&self) -> Option<Decimal> {
        self.slope
            .checked_mul(self.tokens_sold)?
            .checked_add(self.base_price)
    }
}

/// Read-only access to live on-chain and oracle metrics.
///
/// Implementations must be cheap and side-effect free: agents call them on
/// every refresh and the governor calls them again during aggregation.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Raw supply (integer units) per chain id.
    async fn chain_supplies(&self, token: &str) -> Result<BTreeMap<u64, u128>>;

    /// Observed USD price of one token.
    async fn unit_price(&self, token: &str) -> Result<Decimal>;

    async fn reserve_attestation(&self, token: &str) -> Result<ReserveAttestation>;

    async fn hedge_position(&self, token: &str) -> Result<HedgePosition>;

    async fn curve_state(&self, token: &str) -> Result<CurveState>;
}

/// Constant readings per token.
///
/// Not yet backed by RPC: this is the placeholder every deployment runs
/// with until a chain-reading source exists. Tests use it to pin metrics.
#[derive(Default)]
pub struct FixedMetricSource {
    supplies: HashMap<String, BTreeMap<u64, u128>>,
    prices: HashMap<String, Decimal>,
    reserves: HashMap<String, ReserveAttestation>,
    hedges: HashMap<String, HedgePosition>,
    curves: HashMap<String, CurveState>,
    offline: AtomicBool,
}

impl FixedMetricSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Healthy readings for the three default instruments.
    pub fn placeholder(gold: &str, synthetic: &str, launchpad: &str) -> Self {
        const E18: u128 = 1_000_000_000_000_000_000;

        Self::new()
            .with_supplies(gold, BTreeMap::from([(1, 1_000_000 * E18)]))
            .with_price(gold, Decimal::ONE)
            .with_reserve(
                gold,
                ReserveAttestation {
                    reserve_value_usd: dec!(1060000),
                    liability_usd: dec!(1000000),
                },
            )
            .with_supplies(synthetic, BTreeMap::from([(1, 1_000_000 * E18)]))
            .with_price(synthetic, Decimal::ONE)
            .with_hedge(
                synthetic,
                HedgePosition {
                    spot_collateral_usd: dec!(1120000),
                    short_unrealized_pnl_usd: Decimal::ZERO,
                    accrued_funding_usd: Decimal::ZERO,
                    liability_usd: dec!(1000000),
                },
            )
            .with_supplies(launchpad, BTreeMap::from([(1, 0)]))
            .with_curve(
                launchpad,
                CurveState {
                    tokens_sold: Decimal::ZERO,
                    graduation_supply: dec!(800000000),
                    reserve_balance: Decimal::ZERO,
                    base_price: dec!(0.00001),
                    slope: dec!(0.0000000001),
                },
            )
    }

    pub fn with_supplies(mut self, token: &str, supplies: BTreeMap<u64, u128>) -> Self {
        self.supplies.insert(token.to_string(), supplies);
        self
    }

    pub fn with_price(mut self, token: &str, price: Decimal) -> Self {
        self.prices.insert(token.to_string(), price);
        self
    }

    pub fn with_reserve(mut self, token: &str, reserve: ReserveAttestation) -> Self {
        self.reserves.insert(token.to_string(), reserve);
        self
    }

    pub fn with_hedge(mut self, token: &str, hedge: HedgePosition) -> Self {
        self.hedges.insert(token.to_string(), hedge);
        self
    }

    pub fn with_curve(mut self, token: &str, curve: CurveState) -> Self {
        self.curves.insert(token.to_string(), curve);
        self
    }

    /// Simulate an outage: every read fails until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn lookup<T: Clone>(&self, map: &HashMap<String, T>, token: &str, what: &str) -> Result<T> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SentryError::source_unavailable(self.name(), "source offline"));
        }
        map.get(token).cloned().ok_or_else(|| {
            SentryError::source_unavailable(self.name(), format!("no {what} for {token}"))
        })
    }
}

#[async_trait]
impl MetricSource for FixedMetricSource {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn chain_supplies(&self, token: &str) -> Result<BTreeMap<u64, u128>> {
        self.lookup(&self.supplies, token, "supply")
    }

    async fn unit_price(&self, token: &str) -> Result<Decimal> {
        self.lookup(&self.prices, token, "price")
    }

    async fn reserve_attestation(&self, token: &str) -> Result<ReserveAttestation> {
        self.lookup(&self.reserves, token, "reserve attestation")
    }

    async fn hedge_position(&self, token: &str) -> Result<HedgePosition> {
        self.lookup(&self.hedges, token, "hedge position")
    }

    async fn curve_state(&self, token: &str) -> Result<CurveState> {
        self.lookup(&self.curves, token, "curve state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_reserve_linear_curve() {
        let curve = CurveState {
            tokens_sold: dec!(1000),
            graduation_supply: dec!(10000),
            reserve_balance: Decimal::ZERO,
            base_price: dec!(0.01),
            slope: dec!(0.0001),
        };
        // 0.01 * 1000 + 0.0001 * 1000^2 / 2
        assert_eq!(curve.expected_reserve(), Some(dec!(60)));
        assert_eq!(curve.spot_price(), Some(dec!(0.11)));
    }

    #[test]
    fn test_curve_overflow_is_none() {
        let curve = CurveState {
            tokens_sold: Decimal::MAX,
            graduation_supply: dec!(10000),
            reserve_balance: Decimal::ZERO,
            base_price: dec!(0.01),
            slope: dec!(2),
        };
        assert_eq!(curve.expected_reserve(), None);
        assert_eq!(curve.spot_price(), None);
    }

    #[test]
    fn test_hedge_net_collateral() {
        let hedge = HedgePosition {
            spot_collateral_usd: dec!(1100),
            short_unrealized_pnl_usd: dec!(-30),
            accrued_funding_usd: dec!(5),
            liability_usd: dec!(1000),
        };
        assert_eq!(hedge.net_collateral_usd(), Some(dec!(1075)));

        let overflowing = HedgePosition {
            spot_collateral_usd: Decimal::MAX,
            accrued_funding_usd: Decimal::MAX,
            ..hedge
        };
        assert_eq!(overflowing.net_collateral_usd(), None);
    }

    #[tokio::test]
    async fn test_fixed_source_offline() {
        let source = FixedMetricSource::placeholder("gold", "synthetic", "launchpad");
        assert_eq!(source.unit_price("gold").await.unwrap(), Decimal::ONE);

        source.set_offline(true);
        assert!(matches!(
            source.unit_price("gold").await,
            Err(SentryError::SourceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_fixed_source_unknown_token() {
        let source = FixedMetricSource::new();
        assert!(source.chain_supplies("nope").await.is_err());
    }
}
