//! Alert routing table
//!
//! Static mapping from risk level to notification channels, recipient tags
//! and whether an operator must acknowledge. Alert severities map onto the
//! same table through [`route_severity`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{Alert, AlertSeverity, RiskLevel};

/// Logical notification channel. Bound to concrete chat destinations by
/// the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelId {
    /// Standing low-priority channel; every report summary lands here
    Operations,
    /// Risk desk
    Alerts,
    /// Paging channel for signers and on-call
    Escalation,
}

impl ChannelId {
    pub const ALL: [ChannelId; 3] = [ChannelId::Operations, ChannelId::Alerts, ChannelId::Escalation];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelId::Operations => "operations",
            ChannelId::Alerts => "alerts",
            ChannelId::Escalation => "escalation",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPolicy {
    pub level: RiskLevel,
    pub channels: &'static [ChannelId],
    pub recipients: &'static [&'static str],
    pub requires_ack: bool,
}

/// The routing table, one row per risk level in ascending order.
///
/// | level  | channels                         | recipients                | ack |
/// |--------|----------------------------------|---------------------------|-----|
/// | GREEN  | -                                | -                         | no  |
/// | YELLOW | operations                       | ops                       | no  |
/// | ORANGE | operations, alerts               | ops, risk                 | yes |
/// | RED    | operations, alerts, escalation   | ops, risk, signers        | yes |
pub const ROUTING_TABLE: [AlertPolicy; 4] = [
    AlertPolicy {
        level: RiskLevel::Green,
        channels: &[],
        recipients: &[],
        requires_ack: false,
    },
    AlertPolicy {
        level: RiskLevel::Yellow,
        channels: &[ChannelId::Operations],
        recipients: &["ops"],
        requires_ack: false,
    },
    AlertPolicy {
        level: RiskLevel::Orange,
        channels: &[ChannelId::Operations, ChannelId::Alerts],
        recipients: &["ops", "risk"],
        requires_ack: true,
    },
    AlertPolicy {
        level: RiskLevel::Red,
        channels: &ChannelId::ALL,
        recipients: &["ops", "risk", "signers"],
        requires_ack: true,
    },
];

pub fn policy_for(level: RiskLevel) -> &'static AlertPolicy {
    match level {
        RiskLevel::Green => &ROUTING_TABLE[0],
        RiskLevel::Yellow => &ROUTING_TABLE[1],
        RiskLevel::Orange => &ROUTING_TABLE[2],
        RiskLevel::Red => &ROUTING_TABLE[3],
    }
}

/// Row of the routing table an alert severity uses.
pub fn route_severity(severity: AlertSeverity) -> RiskLevel {
    match severity {
        AlertSeverity::Low | AlertSeverity::Warning => RiskLevel::Yellow,
        AlertSeverity::Medium | AlertSeverity::High => RiskLevel::Orange,
        AlertSeverity::Critical => RiskLevel::Red,
    }
}

pub fn policy_for_severity(severity: AlertSeverity) -> &'static AlertPolicy {
    policy_for(route_severity(severity))
}

/// HIGH and CRITICAL alerts, in detection order.
pub fn escalated(alerts: &[Alert]) -> Vec<&Alert> {
    alerts
        .iter()
        .filter(|a| a.severity().is_escalation())
        .collect()
}

/// Policy for an escalation: the worse of the overall level's row and the
/// worst escalated alert's row. `None` when no alert is HIGH or above and
/// the overall level is below RED.
pub fn escalation_policy(alerts: &[Alert], overall: RiskLevel) -> Option<&'static AlertPolicy> {
    let worst = escalated(alerts)
        .into_iter()
        .map(|a| route_severity(a.severity()))
        .max();
    if worst.is_none() && overall < RiskLevel::Red {
        return None;
    }
    Some(policy_for(worst.unwrap_or(overall).max(overall)))
}
