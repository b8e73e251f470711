use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::serde_utils::{i128_string, u128_string};

/// Supply of one token on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSupply {
    #[serde(with = "u128_string")]
    pub amount: u128,
    #[serde(with = "i128_string")]
    pub change_24h: i128,
    /// Percent change over 24h, 4 decimal places.
    pub change_pct: Decimal,
}

/// Point-in-time supply snapshot for one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub timestamp: DateTime<Utc>,
    pub token: String,
    /// Keyed by chain id.
    pub chains: BTreeMap<u64, ChainSupply>,
    #[serde(with = "u128_string")]
    pub total: u128,
    #[serde(with = "i128_string")]
    pub total_change_24h: i128,
}

impl MetricSnapshot {
    /// Build a snapshot from current per-chain supply, diffing against the
    /// snapshot closest to 24h ago. A missing baseline, or a chain missing
    /// from it, yields a zero delta.
    pub fn build(
        token: &str,
        timestamp: DateTime<Utc>,
        supplies: &BTreeMap<u64, u128>,
        baseline: Option<&MetricSnapshot>,
    ) -> Self {
        let chains: BTreeMap<u64, ChainSupply> = supplies
            .iter()
            .map(|(chain_id, amount)| {
                let previous = baseline
                    .and_then(|b| b.chains.get(chain_id))
                    .map(|c| c.amount);
                let change_24h = previous.map_or(0, |prev| signed_delta(*amount, prev));
                let change_pct = previous.map_or(Decimal::ZERO, |prev| percent(change_24h, prev));
                (
                    *chain_id,
                    ChainSupply {
                        amount: *amount,
                        change_24h,
                        change_pct,
                    },
                )
            })
            .collect();

        let total = supplies.values().fold(0u128, |acc, v| acc.saturating_add(*v));
        let total_change_24h = baseline.map_or(0, |b| signed_delta(total, b.total));

        Self {
            timestamp,
            token: token.to_string(),
            chains,
            total,
            total_change_24h,
        }
    }

    /// Percent change of the total over 24h.
    pub fn total_change_pct(&self) -> Decimal {
        let previous = signed_delta(self.total, 0).saturating_sub(self.total_change_24h);
        if previous <= 0 {
            return Decimal::ZERO;
        }
        percent(self.total_change_24h, previous as u128)
    }

    /// Total supply in whole tokens.
    pub fn total_units(&self, decimals: u32) -> Option<Decimal> {
        to_units(self.total, decimals)
    }
}

/// Raw integer amount scaled down by `decimals`. `None` when out of range.
pub fn to_units(raw: u128, decimals: u32) -> Option<Decimal> {
    let signed = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(signed, decimals).ok()
}

fn signed_delta(current: u128, previous: u128) -> i128 {
    let current = i128::try_from(current).unwrap_or(i128::MAX);
    let previous = i128::try_from(previous).unwrap_or(i128::MAX);
    current.saturating_sub(previous)
}

fn percent(delta: i128, previous: u128) -> Decimal {
    if previous == 0 {
        return Decimal::ZERO;
    }
    let (Some(delta), Some(previous)) = (
        Decimal::try_from_i128_with_scale(delta, 0).ok(),
        i128::try_from(previous)
            .ok()
            .and_then(|p| Decimal::try_from_i128_with_scale(p, 0).ok()),
    ) else {
        return Decimal::ZERO;
    };
    // Changes too large for a Decimal percent report as zero.
    delta
        .checked_div(previous)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(Decimal::ZERO, |pct| pct.round_dp(4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    const ETH: u64 = 1;
    const ARB: u64 = 42161;
    const E18: u128 = 1_000_000_000_000_000_000;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_without_baseline_deltas_are_zero() {
        let supplies = BTreeMap::from([(ETH, 1_000 * E18), (ARB, 500 * E18)]);
        let snap = MetricSnapshot::build("gold", ts(0), &supplies, None);

        assert_eq!(snap.total, 1_500 * E18);
        assert_eq!(snap.total_change_24h, 0);
        assert!(snap.chains.values().all(|c| c.change_24h == 0));
        assert_eq!(snap.total_change_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_deltas_against_baseline() {
        let base = MetricSnapshot::build(
            "gold",
            ts(0),
            &BTreeMap::from([(ETH, 1_000 * E18), (ARB, 500 * E18)]),
            None,
        );
        let snap = MetricSnapshot::build(
            "gold",
            ts(4),
            &BTreeMap::from([(ETH, 1_100 * E18), (ARB, 450 * E18)]),
            Some(&base),
        );

        assert_eq!(snap.chains[&ETH].change_24h, (100 * E18) as i128);
        assert_eq!(snap.chains[&ETH].change_pct, dec!(10));
        assert_eq!(snap.chains[&ARB].change_24h, -((50 * E18) as i128));
        assert_eq!(snap.chains[&ARB].change_pct, dec!(-10));
        assert_eq!(snap.total_change_24h, (50 * E18) as i128);
        assert_eq!(snap.total_change_pct(), dec!(3.3333));
    }

    #[test]
    fn test_new_chain_has_zero_delta() {
        let base = MetricSnapshot::build("gold", ts(0), &BTreeMap::from([(ETH, E18)]), None);
        let snap = MetricSnapshot::build(
            "gold",
            ts(4),
            &BTreeMap::from([(ETH, E18), (ARB, 7 * E18)]),
            Some(&base),
        );
        assert_eq!(snap.chains[&ARB].change_24h, 0);
        assert_eq!(snap.chains[&ARB].change_pct, Decimal::ZERO);
    }

    #[test]
    fn test_json_round_trip_keeps_exact_amounts() {
        let supplies = BTreeMap::from([(ETH, 123_456_789_012_345_678_901_234_567u128)]);
        let snap = MetricSnapshot::build("synthetic", ts(8), &supplies, None);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"123456789012345678901234567\""));

        let back: MetricSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn test_extreme_growth_does_not_overflow() {
        let base = MetricSnapshot::build("gold", ts(0), &BTreeMap::from([(ETH, 1)]), None);
        let huge = 10u128.pow(27);
        let snap = MetricSnapshot::build(
            "gold",
            ts(4),
            &BTreeMap::from([(ETH, huge)]),
            Some(&base),
        );
        assert_eq!(snap.chains[&ETH].change_24h, (huge - 1) as i128);
        assert_eq!(snap.chains[&ETH].change_pct, Decimal::ZERO);
        assert_eq!(snap.total_change_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_to_units() {
        assert_eq!(to_units(1_500 * E18, 18), Some(dec!(1500)));
        assert_eq!(to_units(u128::MAX, 18), None);
    }
}
