//! Alert records emitted by the monitoring agents.
//!
//! An alert is immutable once built; the acknowledgement flag is the only
//! field an operator can change afterwards, which is why the fields are
//! private and exposed through getters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Alert severity. Independent of [`RiskLevel`](super::RiskLevel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    Low,
    Warning,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "LOW",
            AlertSeverity::Warning => "WARNING",
            AlertSeverity::Medium => "MEDIUM",
            AlertSeverity::High => "HIGH",
            AlertSeverity::Critical => "CRITICAL",
        }
    }

    /// Severities that trigger the escalation path of a report cycle.
    pub fn is_escalation(&self) -> bool {
        matches!(self, AlertSeverity::High | AlertSeverity::Critical)
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "\u{2139}\u{fe0f}",
            AlertSeverity::Warning => "\u{26a0}\u{fe0f}",
            AlertSeverity::Medium => "\u{1f7e0}",
            AlertSeverity::High => "\u{274c}",
            AlertSeverity::Critical => "\u{1f6a8}",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category tag of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Collateral,
    Peg,
    StaleData,
    CrossChain,
    Emergency,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Collateral => "collateral",
            AlertType::Peg => "peg",
            AlertType::StaleData => "stale_data",
            AlertType::CrossChain => "cross_chain",
            AlertType::Emergency => "emergency",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    id: String,
    #[serde(rename = "type")]
    alert_type: AlertType,
    severity: AlertSeverity,
    source: String,
    message: String,
    #[serde(default)]
    payload: serde_json::Value,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    acknowledged: bool,
}

impl Alert {
    pub fn new(
        alert_type: AlertType,
        severity: AlertSeverity,
        source: &str,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::derive_id(source, alert_type, severity, timestamp),
            alert_type,
            severity,
            source: source.to_string(),
            message: message.into(),
            payload: serde_json::Value::Null,
            timestamp,
            acknowledged: false,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// `sha256(source|type|severity|timestamp)`, truncated to 16 bytes.
    fn derive_id(
        source: &str,
        alert_type: AlertType,
        severity: AlertSeverity,
        timestamp: DateTime<Utc>,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update(b"|");
        hasher.update(alert_type.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(severity.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(timestamp.timestamp_millis().to_be_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..16])
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn alert_type(&self) -> AlertType {
        self.alert_type
    }

    pub fn severity(&self) -> AlertSeverity {
        self.severity
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// Operator acknowledgement. Idempotent.
    pub fn acknowledge(&mut self) {
        self.acknowledged = true;
    }

    /// One-line rendering used in chat messages.
    pub fn format_line(&self) -> String {
        format!(
            "{} [{}] {}: {}",
            self.severity.emoji(),
            self.severity,
            self.source,
            self.message
        )
    }
}
