//! Shared state and plumbing for token risk agents
//!
//! Each concrete agent owns an `AgentCore`: its identity, threshold table,
//! metric source, snapshot store and a last-known cache used when the
//! source is unreachable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::thresholds::{
    classify_collateral, classify_peg, collateral_severity, peg_severity, ThresholdTable,
};
use crate::adapters::MetricSource;
use crate::domain::{
    Alert, AlertSeverity, AlertType, AgentMetrics, AgentReport, MetricSnapshot, RiskLevel,
};
use crate::error::{Result, SentryError};
use crate::persistence::SnapshotStore;

/// Level assigned to a metric no source has ever returned.
pub const UNOBSERVED_LEVEL: RiskLevel = RiskLevel::Yellow;

/// Ratio reported when there is no outstanding liability.
pub const NO_LIABILITY_RATIO: Decimal = Decimal::MAX;

/// `backing / liability`, or [`NO_LIABILITY_RATIO`] when nothing is owed.
pub fn backing_ratio(backing: Decimal, liability: Decimal) -> Decimal {
    if liability <= Decimal::ZERO {
        return NO_LIABILITY_RATIO;
    }
    if backing <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    // A quotient past the Decimal range saturates.
    backing
        .checked_div(liability)
        .unwrap_or(NO_LIABILITY_RATIO)
}

/// `|price - 1.00|`, saturating at `Decimal::MAX`.
pub fn peg_gap(price: Decimal) -> Decimal {
    price
        .checked_sub(Decimal::ONE)
        .map_or(Decimal::MAX, |d| d.abs())
}

/// A metric value plus whether it came from the last-known cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricReading {
    pub value: Option<Decimal>,
    pub stale: bool,
}

impl MetricReading {
    pub fn fresh(value: Decimal) -> Self {
        Self {
            value: Some(value),
            stale: false,
        }
    }
}

/// Result of a snapshot refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRefresh {
    pub snapshot: MetricSnapshot,
    /// Source unreachable; `snapshot` is the last known one.
    pub stale: bool,
    /// Set when reading the baseline or persisting the snapshot failed.
    pub storage_error: Option<String>,
}

/// Both metrics of one assessment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub price: MetricReading,
    pub peg_deviation: MetricReading,
    pub collateral_ratio: MetricReading,
    pub launch_progress: Option<Decimal>,
}

impl Assessment {
    pub fn stale(&self) -> bool {
        self.price.stale || self.peg_deviation.stale || self.collateral_ratio.stale
    }
}

#[derive(Debug, Default)]
struct LastKnown {
    snapshot: Option<MetricSnapshot>,
    snapshot_stale: bool,
    price: Option<Decimal>,
    collateral_ratio: Option<Decimal>,
}

pub struct AgentCore {
    id: String,
    token: String,
    thresholds: ThresholdTable,
    source: Arc<dyn MetricSource>,
    snapshots: SnapshotStore,
    source_timeout: Duration,
    last_known: RwLock<LastKnown>,
}

impl AgentCore {
    pub fn new(
        id: &str,
        token: &str,
        thresholds: ThresholdTable,
        source: Arc<dyn MetricSource>,
        snapshots: SnapshotStore,
        source_timeout: Duration,
    ) -> Self {
        Self {
            id: id.to_string(),
            token: token.to_string(),
            thresholds,
            source,
            snapshots,
            source_timeout,
            last_known: RwLock::new(LastKnown::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    pub fn source(&self) -> &dyn MetricSource {
        self.source.as_ref()
    }

    /// Run one source call under the source timeout.
    pub async fn fetch<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        match tokio::time::timeout(self.source_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(SentryError::Timeout(format!(
                "{} {} for {} after {}ms",
                self.source.name(),
                what,
                self.token,
                self.source_timeout.as_millis()
            ))),
        }
    }

    pub async fn refresh_snapshot(&self, now: DateTime<Utc>) -> Result<SnapshotRefresh> {
        let supplies = match self
            .fetch("chain supplies", self.source.chain_supplies(&self.token))
            .await
        {
            Ok(supplies) => supplies,
            Err(e) => {
                warn!("[{}] supply read failed, using last known snapshot: {}", self.id, e);
                return self.last_known_snapshot().await;
            }
        };

        let mut storage_error = None;
        let baseline = match self.snapshots.find_day_ago(&self.token, now).await {
            Ok(baseline) => baseline,
            Err(e) => {
                warn!("[{}] baseline lookup failed, zero delta: {}", self.id, e);
                storage_error = Some(e.to_string());
                None
            }
        };

        let snapshot = MetricSnapshot::build(&self.token, now, &supplies, baseline.as_ref());
        match self.snapshots.put(&snapshot).await {
            Ok(key) => debug!("[{}] snapshot stored at {}", self.id, key),
            // Retried refresh for the same instant: already stored.
            Err(SentryError::AlreadyExists(key)) => {
                debug!("[{}] snapshot {} already stored", self.id, key)
            }
            Err(e) => {
                warn!("[{}] failed to persist snapshot: {}", self.id, e);
                storage_error = Some(e.to_string());
            }
        }

        let mut last = self.last_known.write().await;
        last.snapshot = Some(snapshot.clone());
        last.snapshot_stale = false;

        Ok(SnapshotRefresh {
            snapshot,
            stale: false,
            storage_error,
        })
    }

    async fn last_known_snapshot(&self) -> Result<SnapshotRefresh> {
        let cached = {
            let mut last = self.last_known.write().await;
            last.snapshot_stale = true;
            last.snapshot.clone()
        };

        let snapshot = match cached {
            Some(snapshot) => snapshot,
            None => self.snapshots.latest(&self.token).await?.ok_or_else(|| {
                SentryError::source_unavailable(
                    self.source.name(),
                    format!("no snapshot ever recorded for {}", self.token),
                )
            })?,
        };

        self.last_known.write().await.snapshot = Some(snapshot.clone());
        Ok(SnapshotRefresh {
            snapshot,
            stale: true,
            storage_error: None,
        })
    }

    pub async fn current_snapshot(&self) -> (Option<MetricSnapshot>, bool) {
        let last = self.last_known.read().await;
        (last.snapshot.clone(), last.snapshot_stale)
    }

    /// Record a fresh value, or fall back to the last known one.
    pub async fn settle(&self, metric: Metric, fresh: Result<Decimal>) -> MetricReading {
        let mut last = self.last_known.write().await;
        let slot = match metric {
            Metric::Price => &mut last.price,
            Metric::CollateralRatio => &mut last.collateral_ratio,
        };
        match fresh {
            Ok(value) => {
                *slot = Some(value);
                MetricReading::fresh(value)
            }
            Err(e) => {
                warn!("[{}] {:?} read failed, using last known: {}", self.id, metric, e);
                MetricReading {
                    value: *slot,
                    stale: true,
                }
            }
        }
    }

    pub fn collateral_level(&self, reading: &MetricReading) -> RiskLevel {
        reading
            .value
            .map(|r| classify_collateral(r, &self.thresholds.collateral))
            .unwrap_or(UNOBSERVED_LEVEL)
    }

    pub fn peg_level(&self, reading: &MetricReading) -> RiskLevel {
        reading
            .value
            .map(|d| classify_peg(d, &self.thresholds.peg))
            .unwrap_or(UNOBSERVED_LEVEL)
    }

    /// Alerts for one assessment. GREEN metrics produce nothing.
    pub fn alerts_for(&self, assessment: &Assessment, now: DateTime<Utc>) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if let Some(ratio) = assessment.collateral_ratio.value {
            let t = &self.thresholds.collateral;
            if let Some(severity) = collateral_severity(ratio, t) {
                let level = classify_collateral(ratio, t);
                let message = if severity == AlertSeverity::Critical {
                    format!(
                        "{} collateral ratio {} below critical floor {}",
                        self.token,
                        ratio.round_dp(4),
                        t.critical
                    )
                } else {
                    format!(
                        "{} collateral ratio {} is {} (green at {})",
                        self.token,
                        ratio.round_dp(4),
                        level,
                        t.green
                    )
                };
                alerts.push(
                    Alert::new(AlertType::Collateral, severity, &self.id, message, now)
                        .with_payload(json!({
                            "token": self.token,
                            "ratio": ratio,
                            "level": level,
                            "stale": assessment.collateral_ratio.stale,
                        })),
                );
            }
        }

        if let Some(deviation) = assessment.peg_deviation.value {
            let t = &self.thresholds.peg;
            if let Some(severity) = peg_severity(deviation, t) {
                let level = classify_peg(deviation, t);
                alerts.push(
                    Alert::new(
                        AlertType::Peg,
                        severity,
                        &self.id,
                        format!(
                            "{} peg deviation {}% is {}",
                            self.token,
                            deviation
                                .checked_mul(Decimal::ONE_HUNDRED)
                                .unwrap_or(Decimal::MAX)
                                .round_dp(2),
                            level
                        ),
                        now,
                    )
                    .with_payload(json!({
                        "token": self.token,
                        "deviation": deviation,
                        "price": assessment.price.value,
                        "level": level,
                    })),
                );
            }
        }

        if assessment.stale() {
            alerts.push(
                Alert::new(
                    AlertType::StaleData,
                    AlertSeverity::Warning,
                    &self.id,
                    format!(
                        "{} metrics from {} unavailable, reporting last known values",
                        self.token,
                        self.source.name()
                    ),
                    now,
                )
                .with_payload(json!({ "token": self.token })),
            );
        }

        alerts
    }

    pub async fn report(&self, assessment: &Assessment, now: DateTime<Utc>) -> AgentReport {
        let (snapshot, snapshot_stale) = self.current_snapshot().await;
        let alert_count = self.alerts_for(assessment, now).len();

        AgentReport {
            agent: self.id.clone(),
            token: self.token.clone(),
            generated_at: now,
            snapshot,
            metrics: AgentMetrics {
                price: assessment.price.value.unwrap_or_default(),
                peg_deviation: assessment.peg_deviation.value.unwrap_or_default(),
                collateral_ratio: assessment.collateral_ratio.value.unwrap_or_default(),
                launch_progress: assessment.launch_progress,
            },
            collateral_risk: self.collateral_level(&assessment.collateral_ratio),
            peg_risk: self.peg_level(&assessment.peg_deviation),
            alert_count,
            stale: snapshot_stale || assessment.stale(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Price,
    CollateralRatio,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_backing_ratio() {
        assert_eq!(backing_ratio(dec!(106), dec!(100)), dec!(1.06));
        assert_eq!(backing_ratio(dec!(5), Decimal::ZERO), NO_LIABILITY_RATIO);
        assert_eq!(backing_ratio(dec!(-5), dec!(100)), Decimal::ZERO);
    }

    #[test]
    fn test_backing_ratio_saturates_on_tiny_liability() {
        let dust = Decimal::new(1, 28);
        assert_eq!(backing_ratio(Decimal::MAX, dust), NO_LIABILITY_RATIO);
        assert_eq!(backing_ratio(-Decimal::MAX, dust), Decimal::ZERO);
    }

    #[test]
    fn test_peg_gap() {
        assert_eq!(peg_gap(dec!(0.97)), dec!(0.03));
        assert_eq!(peg_gap(dec!(1.2)), dec!(0.2));
        assert_eq!(peg_gap(Decimal::MIN), Decimal::MAX);
    }
}
