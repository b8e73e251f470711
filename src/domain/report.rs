use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::alert::Alert;
use super::emergency::EmergencyStatus;
use super::risk::{RiskLevel, RiskStatus};
use super::snapshot::MetricSnapshot;

/// Metrics derived by a token agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    pub price: Decimal,
    pub peg_deviation: Decimal,
    pub collateral_ratio: Decimal,
    /// Launchpad only: fraction of the graduation supply sold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_progress: Option<Decimal>,
}

/// Report emitted by one token agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReport {
    pub agent: String,
    pub token: String,
    pub generated_at: DateTime<Utc>,
    pub snapshot: Option<MetricSnapshot>,
    pub metrics: AgentMetrics,
    pub collateral_risk: RiskLevel,
    pub peg_risk: RiskLevel,
    pub alert_count: usize,
    /// Set when any figure in this report is last-known data rather than
    /// a fresh read from the metric source.
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernorReport {
    pub risk_status: RiskStatus,
    pub cross_chain_messages_verified: u64,
    pub emergency_status: EmergencyStatus,
}

/// One item from the ecosystem intelligence feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelSignal {
    pub topic: String,
    pub summary: String,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverReport {
    pub generated_at: DateTime<Utc>,
    pub signals: Vec<IntelSignal>,
    pub stale: bool,
}

/// Combined output of one report cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalReport {
    pub timestamp: DateTime<Utc>,
    pub period: String,
    pub agents: Vec<AgentReport>,
    pub governor: GovernorReport,
    pub observer: ObserverReport,
    pub summary: String,
}

impl OperationalReport {
    pub fn new(
        timestamp: DateTime<Utc>,
        period: &str,
        agents: Vec<AgentReport>,
        governor: GovernorReport,
        observer: ObserverReport,
    ) -> Self {
        let summary = format_summary(timestamp, period, &agents, &governor, &observer);
        Self {
            timestamp,
            period: period.to_string(),
            agents,
            governor,
            observer,
            summary,
        }
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.governor.risk_status.alerts
    }

    pub fn overall(&self) -> RiskLevel {
        self.governor.risk_status.overall
    }
}

fn format_summary(
    timestamp: DateTime<Utc>,
    period: &str,
    agents: &[AgentReport],
    governor: &GovernorReport,
    observer: &ObserverReport,
) -> String {
    let status = &governor.risk_status;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} Ecosystem report ({}) - {}",
        status.overall.emoji(),
        period,
        timestamp.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        out,
        "Overall: {} | Collateral: {} | Peg: {} | Liquidity: {} | Cross-chain: {}",
        status.overall,
        status.categories.collateral,
        status.categories.peg,
        status.categories.liquidity,
        status.categories.cross_chain
    );

    for report in agents {
        // Decimal::MAX marks "no outstanding liability".
        let ratio = if report.metrics.collateral_ratio == Decimal::MAX {
            "n/a".to_string()
        } else {
            report.metrics.collateral_ratio.round_dp(4).to_string()
        };
        let stale = if report.stale { " (stale)" } else { "" };
        let supply = report
            .snapshot
            .as_ref()
            .map(|s| format!(" | Supply 24h: {:+}%", s.total_change_pct()))
            .unwrap_or_default();
        let progress = report
            .metrics
            .launch_progress
            .map(|p| format!(" | Launch: {}%", (p * Decimal::ONE_HUNDRED).round_dp(2)))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "- {}{}: ratio {} ({}) | peg dev {} ({}){}{} | alerts {}",
            report.agent,
            stale,
            ratio,
            report.collateral_risk,
            report.metrics.peg_deviation.round_dp(4),
            report.peg_risk,
            supply,
            progress,
            report.alert_count
        );
    }

    let _ = writeln!(
        out,
        "Cross-chain messages verified: {} | Emergency: {}",
        governor.cross_chain_messages_verified, governor.emergency_status
    );
    if !observer.signals.is_empty() {
        let _ = writeln!(out, "Intelligence signals: {}", observer.signals.len());
    }

    if status.alerts.is_empty() {
        out.push_str("No active alerts");
    } else {
        let _ = write!(out, "Alerts ({}):", status.alerts.len());
        for alert in &status.alerts {
            let _ = write!(out, "\n{}", alert.format_line());
        }
    }

    out
}
