use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::alert::Alert;

/// Four-level risk scale. Variant order is the risk order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Green,
    Yellow,
    Orange,
    Red,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Green,
        RiskLevel::Yellow,
        RiskLevel::Orange,
        RiskLevel::Red,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Green => "GREEN",
            RiskLevel::Yellow => "YELLOW",
            RiskLevel::Orange => "ORANGE",
            RiskLevel::Red => "RED",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Green => "\u{1f7e2}",
            RiskLevel::Yellow => "\u{1f7e1}",
            RiskLevel::Orange => "\u{1f7e0}",
            RiskLevel::Red => "\u{1f534}",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Worst-of aggregation. An empty input is GREEN.
pub fn aggregate_overall<I>(levels: I) -> RiskLevel
where
    I: IntoIterator<Item = RiskLevel>,
{
    levels.into_iter().max().unwrap_or_default()
}

/// Per-category risk levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCategories {
    pub collateral: RiskLevel,
    pub peg: RiskLevel,
    pub liquidity: RiskLevel,
    pub cross_chain: RiskLevel,
}

impl RiskCategories {
    pub fn levels(&self) -> [RiskLevel; 4] {
        [self.collateral, self.peg, self.liquidity, self.cross_chain]
    }

    pub fn overall(&self) -> RiskLevel {
        aggregate_overall(self.levels())
    }
}

/// Aggregated ecosystem risk.
///
/// Always rebuilt from scratch through [`RiskStatus::new`]; `overall` is
/// derived from `categories` and never assigned on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskStatus {
    pub overall: RiskLevel,
    pub categories: RiskCategories,
    /// Detection order, not chronological order.
    pub alerts: Vec<Alert>,
    pub last_updated: DateTime<Utc>,
}

impl RiskStatus {
    pub fn new(categories: RiskCategories, alerts: Vec<Alert>, now: DateTime<Utc>) -> Self {
        Self {
            overall: categories.overall(),
            categories,
            alerts,
            last_updated: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Green < RiskLevel::Yellow);
        assert!(RiskLevel::Yellow < RiskLevel::Orange);
        assert!(RiskLevel::Orange < RiskLevel::Red);
    }

    #[test]
    fn test_overall_is_max_for_every_combination() {
        for collateral in RiskLevel::ALL {
            for peg in RiskLevel::ALL {
                for liquidity in RiskLevel::ALL {
                    for cross_chain in RiskLevel::ALL {
                        let categories = RiskCategories {
                            collateral,
                            peg,
                            liquidity,
                            cross_chain,
                        };
                        let overall = categories.overall();
                        let levels = categories.levels();

                        assert!(levels.iter().all(|l| overall >= *l));
                        assert!(levels.contains(&overall));
                        if levels.contains(&RiskLevel::Red) {
                            assert_eq!(overall, RiskLevel::Red);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_all_green_is_green() {
        assert_eq!(RiskCategories::default().overall(), RiskLevel::Green);
        assert_eq!(aggregate_overall(Vec::new()), RiskLevel::Green);
    }

    #[test]
    fn test_status_derives_overall() {
        let categories = RiskCategories {
            collateral: RiskLevel::Orange,
            ..Default::default()
        };
        let status = RiskStatus::new(categories, Vec::new(), Utc::now());
        assert_eq!(status.overall, RiskLevel::Orange);
    }

    #[test]
    fn test_risk_level_serializes_uppercase() {
        let json = serde_json::to_string(&RiskLevel::Orange).unwrap();
        assert_eq!(json, "\"ORANGE\"");
    }
}
