use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SentryError};

/// Function selector of `pause()`: first four bytes of `keccak256("pause()")`.
pub const PAUSE_SELECTOR: &str = "0x8456cb59";

/// Ecosystem emergency state machine.
///
/// The monitor itself only ever drives `Standby -> Active`; every other
/// transition is an operator action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmergencyStatus {
    #[default]
    Standby,
    Active,
    Paused,
}

impl EmergencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencyStatus::Standby => "STANDBY",
            EmergencyStatus::Active => "ACTIVE",
            EmergencyStatus::Paused => "PAUSED",
        }
    }

    pub fn can_transition_to(&self, target: EmergencyStatus) -> bool {
        use EmergencyStatus::*;

        match (self, target) {
            // Pause proposal prepared
            (Standby, Active) => true,
            // Multisig executed the pause
            (Active, Paused) => true,
            // Proposal withdrawn or rejected
            (Active, Standby) => true,
            // Recovery
            (Paused, Standby) => true,
            (a, b) => *a == b,
        }
    }
}

impl fmt::Display for EmergencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted emergency state and who moved it last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyState {
    pub status: EmergencyStatus,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PauseStatus {
    AwaitingApproval,
    Approved,
    Rejected,
}

impl PauseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PauseStatus::AwaitingApproval => "AWAITING_APPROVAL",
            PauseStatus::Approved => "APPROVED",
            PauseStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, PauseStatus::AwaitingApproval)
    }
}

impl fmt::Display for PauseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision recorded by the external approval authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseDecision {
    Approve,
    Reject,
}

impl PauseDecision {
    fn status(&self) -> PauseStatus {
        match self {
            PauseDecision::Approve => PauseStatus::Approved,
            PauseDecision::Reject => PauseStatus::Rejected,
        }
    }
}

/// A prepared, never executed, pause proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseTransaction {
    pub target: String,
    pub selector: String,
    pub reason: String,
    pub prepared_at: DateTime<Utc>,
    pub prepared_by: String,
    status: PauseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolved_at: Option<DateTime<Utc>>,
}

impl PauseTransaction {
    pub fn prepare(target: &str, reason: &str, preparer: &str, now: DateTime<Utc>) -> Self {
        Self {
            target: target.to_string(),
            selector: PAUSE_SELECTOR.to_string(),
            reason: reason.to_string(),
            prepared_at: now,
            prepared_by: preparer.to_string(),
            status: PauseStatus::AwaitingApproval,
            resolved_by: None,
            resolved_at: None,
        }
    }

    pub fn status(&self) -> PauseStatus {
        self.status
    }

    pub fn resolved_by(&self) -> Option<&str> {
        self.resolved_by.as_deref()
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Record the approval authority's decision. Only valid once, from
    /// `AWAITING_APPROVAL`.
    pub fn resolve(
        &mut self,
        decision: PauseDecision,
        authority: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let target = decision.status();
        if self.status.is_final() {
            return Err(SentryError::InvalidStateTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        if authority.trim().is_empty() {
            return Err(SentryError::Validation(
                "approval authority must be named".to_string(),
            ));
        }

        self.status = target;
        self.resolved_by = Some(authority.to_string());
        self.resolved_at = Some(now);
        Ok(())
    }
}
