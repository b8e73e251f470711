//! Risk threshold tables
//!
//! Four bands per metric. Boundary values belong to the better band, so
//! every comparison is inclusive.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::{AlertSeverity, RiskLevel};

/// "Higher is better" bands for collateral / reserve ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralThresholds {
    /// GREEN at or above
    pub green: Decimal,
    /// YELLOW at or above
    pub yellow: Decimal,
    /// ORANGE at or above, RED below
    pub orange: Decimal,
    /// RED ratios strictly below this are CRITICAL alerts
    pub critical: Decimal,
}

/// "Lower is better" bands for peg deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PegThresholds {
    /// GREEN at or below
    pub green: Decimal,
    /// YELLOW at or below
    pub yellow: Decimal,
    /// ORANGE at or below, RED above
    pub orange: Decimal,
    /// RED deviations strictly above this are CRITICAL alerts
    pub critical: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdTable {
    pub collateral: CollateralThresholds,
    pub peg: PegThresholds,
}

const PEG: PegThresholds = PegThresholds {
    green: dec!(0.005),
    yellow: dec!(0.01),
    orange: dec!(0.02),
    critical: dec!(0.05),
};

impl ThresholdTable {
    /// Reserve-backed instruments (gold-backed stablecoin, launchpad curve).
    pub const STANDARD: ThresholdTable = ThresholdTable {
        collateral: CollateralThresholds {
            green: dec!(1.05),
            yellow: dec!(1.02),
            orange: dec!(1.00),
            critical: dec!(0.98),
        },
        peg: PEG,
    };

    /// Delta-neutral synthetic dollar: hedge slippage needs a wider buffer.
    pub const DELTA_NEUTRAL: ThresholdTable = ThresholdTable {
        collateral: CollateralThresholds {
            green: dec!(1.10),
            yellow: dec!(1.05),
            orange: dec!(1.02),
            critical: dec!(1.00),
        },
        peg: PEG,
    };
}

pub fn classify_collateral(ratio: Decimal, t: &CollateralThresholds) -> RiskLevel {
    if ratio >= t.green {
        RiskLevel::Green
    } else if ratio >= t.yellow {
        RiskLevel::Yellow
    } else if ratio >= t.orange {
        RiskLevel::Orange
    } else {
        RiskLevel::Red
    }
}

pub fn classify_peg(deviation: Decimal, t: &PegThresholds) -> RiskLevel {
    let deviation = deviation.abs();
    if deviation <= t.green {
        RiskLevel::Green
    } else if deviation <= t.yellow {
        RiskLevel::Yellow
    } else if deviation <= t.orange {
        RiskLevel::Orange
    } else {
        RiskLevel::Red
    }
}

/// Alert severity for a classified metric; `None` for GREEN.
fn band_severity(level: RiskLevel, critical: bool) -> Option<AlertSeverity> {
    match level {
        RiskLevel::Green => None,
        RiskLevel::Yellow => Some(AlertSeverity::Low),
        RiskLevel::Orange => Some(AlertSeverity::Medium),
        RiskLevel::Red if critical => Some(AlertSeverity::Critical),
        RiskLevel::Red => Some(AlertSeverity::High),
    }
}

pub fn collateral_severity(ratio: Decimal, t: &CollateralThresholds) -> Option<AlertSeverity> {
    band_severity(classify_collateral(ratio, t), ratio < t.critical)
}

pub fn peg_severity(deviation: Decimal, t: &PegThresholds) -> Option<AlertSeverity> {
    band_severity(classify_peg(deviation, t), deviation.abs() > t.critical)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STD: ThresholdTable = ThresholdTable::STANDARD;
    const DN: ThresholdTable = ThresholdTable::DELTA_NEUTRAL;

    #[test]
    fn test_collateral_boundaries_fall_in_better_band() {
        let t = &STD.collateral;
        assert_eq!(classify_collateral(dec!(1.05), t), RiskLevel::Green);
        assert_eq!(classify_collateral(dec!(1.0499), t), RiskLevel::Yellow);
        assert_eq!(classify_collateral(dec!(1.02), t), RiskLevel::Yellow);
        assert_eq!(classify_collateral(dec!(1.00), t), RiskLevel::Orange);
        assert_eq!(classify_collateral(dec!(0.9999), t), RiskLevel::Red);
    }

    #[test]
    fn test_delta_neutral_bands() {
        let t = &DN.collateral;
        assert_eq!(classify_collateral(dec!(1.10), t), RiskLevel::Green);
        assert_eq!(classify_collateral(dec!(1.06), t), RiskLevel::Yellow);
        assert_eq!(classify_collateral(dec!(1.02), t), RiskLevel::Orange);
        assert_eq!(classify_collateral(dec!(1.01), t), RiskLevel::Red);
    }

    #[test]
    fn test_collateral_monotonic() {
        for table in [STD, DN] {
            let mut previous = RiskLevel::Red;
            let mut ratio = dec!(0.90);
            while ratio <= dec!(1.20) {
                let level = classify_collateral(ratio, &table.collateral);
                assert!(level <= previous, "risk rose at ratio {ratio}");
                previous = level;
                ratio += dec!(0.001);
            }
        }
    }

    #[test]
    fn test_peg_bands() {
        let t = &STD.peg;
        assert_eq!(classify_peg(Decimal::ZERO, t), RiskLevel::Green);
        assert_eq!(classify_peg(dec!(0.005), t), RiskLevel::Green);
        assert_eq!(classify_peg(dec!(0.01), t), RiskLevel::Yellow);
        assert_eq!(classify_peg(dec!(0.02), t), RiskLevel::Orange);
        assert_eq!(classify_peg(dec!(0.0201), t), RiskLevel::Red);
        assert_eq!(classify_peg(dec!(0.06), t), RiskLevel::Red);
    }

    #[test]
    fn test_peg_monotonic() {
        let mut previous = RiskLevel::Green;
        let mut deviation = Decimal::ZERO;
        while deviation <= dec!(0.10) {
            let level = classify_peg(deviation, &STD.peg);
            assert!(level >= previous, "risk fell at deviation {deviation}");
            previous = level;
            deviation += dec!(0.0005);
        }
    }

    #[test]
    fn test_severities() {
        let c = &STD.collateral;
        assert_eq!(collateral_severity(dec!(1.06), c), None);
        assert_eq!(collateral_severity(dec!(1.03), c), Some(AlertSeverity::Low));
        assert_eq!(collateral_severity(dec!(1.01), c), Some(AlertSeverity::Medium));
        assert_eq!(collateral_severity(dec!(0.99), c), Some(AlertSeverity::High));
        assert_eq!(collateral_severity(dec!(0.98), c), Some(AlertSeverity::High));
        assert_eq!(collateral_severity(dec!(0.97), c), Some(AlertSeverity::Critical));

        assert_eq!(
            collateral_severity(dec!(1.01), &DN.collateral),
            Some(AlertSeverity::High)
        );
        assert_eq!(
            collateral_severity(dec!(0.999), &DN.collateral),
            Some(AlertSeverity::Critical)
        );

        let p = &STD.peg;
        assert_eq!(peg_severity(dec!(0.003), p), None);
        assert_eq!(peg_severity(dec!(0.03), p), Some(AlertSeverity::High));
        assert_eq!(peg_severity(dec!(0.05), p), Some(AlertSeverity::High));
        assert_eq!(peg_severity(dec!(0.051), p), Some(AlertSeverity::Critical));
    }
}
