//! Governor agent
//!
//! Aggregates per-agent metrics into the ecosystem risk status, audits
//! cross-chain messages and owns the emergency workflow:
//! - Pause proposals are prepared and stored, never executed
//! - Emergency status is persisted so restarts keep it
//! - The verified-message count is derived from the audit records

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::traits::TokenRiskAgent;
use super::verification::{VerificationStrategy, Verdict};
use crate::adapters::ObjectStore;
use crate::domain::{
    aggregate_overall, Alert, CrossChainMessage, EmergencyState, EmergencyStatus,
    GovernorReport, PauseDecision, PauseStatus, PauseTransaction, RiskCategories, RiskLevel,
    RiskStatus, VerifiedMessage,
};
use crate::error::{Result, SentryError};
use crate::persistence::{keys, read_json, write_json, write_json_new};

pub const GOVERNOR_AGENT_ID: &str = "governor";

/// Level reported for categories with no metric feeding them yet
/// (liquidity depth, cross-chain health).
pub const UNMONITORED_CATEGORY: RiskLevel = RiskLevel::Green;

/// A stored proposal together with its object key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPause {
    pub key: String,
    pub transaction: PauseTransaction,
}

pub struct Governor {
    agents: Vec<Arc<dyn TokenRiskAgent>>,
    store: Arc<dyn ObjectStore>,
    verifier: Arc<dyn VerificationStrategy>,
    /// Serializes read-modify-write of the persisted emergency state.
    emergency_lock: Mutex<()>,
}

impl Governor {
    pub fn new(
        agents: Vec<Arc<dyn TokenRiskAgent>>,
        store: Arc<dyn ObjectStore>,
        verifier: Arc<dyn VerificationStrategy>,
    ) -> Self {
        Self {
            agents,
            store,
            verifier,
            emergency_lock: Mutex::new(()),
        }
    }

    pub fn agents(&self) -> &[Arc<dyn TokenRiskAgent>] {
        &self.agents
    }

    /// Recompute ecosystem risk from the agents' current metrics.
    ///
    /// Built from scratch on every call. Alerts keep agent order.
    pub async fn get_risk_status(&self, now: DateTime<Utc>) -> RiskStatus {
        let assessments = join_all(self.agents.iter().map(|agent| async move {
            let assessment = agent.assess().await;
            let core = agent.core();
            (
                core.collateral_level(&assessment.collateral_ratio),
                core.peg_level(&assessment.peg_deviation),
                core.alerts_for(&assessment, now),
            )
        }))
        .await;

        let mut collateral = Vec::with_capacity(assessments.len());
        let mut peg = Vec::with_capacity(assessments.len());
        let mut alerts: Vec<Alert> = Vec::new();
        for (c, p, a) in assessments {
            collateral.push(c);
            peg.push(p);
            alerts.extend(a);
        }

        let categories = RiskCategories {
            collateral: aggregate_overall(collateral),
            peg: aggregate_overall(peg),
            liquidity: UNMONITORED_CATEGORY,
            cross_chain: UNMONITORED_CATEGORY,
        };
        RiskStatus::new(categories, alerts, now)
    }

    /// Verify a cross-chain message and record it when it passes.
    ///
    /// A rejected message leaves no trace in the store. Re-verifying an
    /// already recorded message succeeds without a second record.
    pub async fn verify_message(
        &self,
        message: &CrossChainMessage,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if let Verdict::Invalid(reason) = self.verifier.verify(message).await {
            info!(
                "[{}] rejected message {:?} ({} -> {}): {}",
                GOVERNOR_AGENT_ID, message.guid, message.src_eid, message.dst_eid, reason
            );
            return Ok(false);
        }

        let record = VerifiedMessage {
            message: message.clone(),
            verified_at: now,
            strategy: self.verifier.name().to_string(),
        };
        match write_json_new(self.store.as_ref(), &message.audit_key(), &record).await {
            Ok(()) => {}
            Err(SentryError::AlreadyExists(key)) => {
                info!("[{}] message already audited at {}", GOVERNOR_AGENT_ID, key)
            }
            Err(e) => return Err(e),
        }
        Ok(true)
    }

    pub async fn verified_message_count(&self) -> Result<u64> {
        let keys = self.store.list(keys::CROSSCHAIN_PREFIX).await?;
        Ok(keys.len() as u64)
    }

    pub async fn emergency_state(&self) -> Result<Option<EmergencyState>> {
        read_json(self.store.as_ref(), keys::EMERGENCY_STATUS_KEY).await
    }

    pub async fn emergency_status(&self) -> Result<EmergencyStatus> {
        Ok(self
            .emergency_state()
            .await?
            .map(|s| s.status)
            .unwrap_or_default())
    }

    async fn write_emergency_state(
        &self,
        status: EmergencyStatus,
        actor: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<EmergencyState> {
        let state = EmergencyState {
            status,
            updated_at: now,
            updated_by: actor.to_string(),
            reason,
        };
        write_json(self.store.as_ref(), keys::EMERGENCY_STATUS_KEY, &state).await?;
        Ok(state)
    }

    /// Operator-driven emergency transition.
    pub async fn set_emergency_status(
        &self,
        target: EmergencyStatus,
        operator: &str,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<EmergencyState> {
        if operator.trim().is_empty() {
            return Err(SentryError::Validation("operator must be named".to_string()));
        }

        let _guard = self.emergency_lock.lock().await;
        let current = self.emergency_status().await?;
        if !current.can_transition_to(target) {
            return Err(SentryError::InvalidStateTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }

        let state = self
            .write_emergency_state(target, operator, reason, now)
            .await?;
        info!(
            "[{}] emergency status {} -> {} by {}",
            GOVERNOR_AGENT_ID, current, target, operator
        );
        Ok(state)
    }

    /// Store a pause proposal awaiting external approval.
    ///
    /// Moves STANDBY to ACTIVE. Nothing is signed or submitted.
    pub async fn prepare_emergency_pause(
        &self,
        target: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<PendingPause> {
        let transaction = PauseTransaction::prepare(target, reason, GOVERNOR_AGENT_ID, now);
        let key = keys::pending_pause_key(now);

        let _guard = self.emergency_lock.lock().await;
        write_json_new(self.store.as_ref(), &key, &transaction).await?;

        let current = self.emergency_status().await?;
        if current == EmergencyStatus::Standby {
            self.write_emergency_state(
                EmergencyStatus::Active,
                GOVERNOR_AGENT_ID,
                Some(reason.to_string()),
                now,
            )
            .await?;
        }
        warn!(
            "[{}] pause proposal for {} stored at {}, awaiting approval",
            GOVERNOR_AGENT_ID, target, key
        );

        Ok(PendingPause { key, transaction })
    }

    pub async fn pending_pauses(&self) -> Result<Vec<PendingPause>> {
        let mut pending = Vec::new();
        for key in self.store.list(keys::PENDING_PAUSE_PREFIX).await? {
            if let Some(transaction) = read_json(self.store.as_ref(), &key).await? {
                pending.push(PendingPause { key, transaction });
            }
        }
        Ok(pending)
    }

    /// Record the approval authority's decision on a stored proposal.
    ///
    /// `id` is either the full pending key or its timestamp fragment. The
    /// resolved proposal moves to `emergency/resolved/`. A rejection that
    /// leaves no other proposal pending returns ACTIVE to STANDBY; an
    /// approval leaves the status to the operator once the pause executes.
    pub async fn resolve_pause(
        &self,
        id: &str,
        decision: PauseDecision,
        authority: &str,
        now: DateTime<Utc>,
    ) -> Result<PendingPause> {
        let stem = id
            .strip_prefix(keys::PENDING_PAUSE_PREFIX)
            .unwrap_or(id)
            .trim_end_matches(".json");
        if stem.is_empty() || stem.contains('/') {
            return Err(SentryError::Validation(format!("invalid proposal id {id:?}")));
        }
        let pending_key = format!("{}{}.json", keys::PENDING_PAUSE_PREFIX, stem);
        let resolved_key = format!("{}{}.json", keys::RESOLVED_PAUSE_PREFIX, stem);

        let _guard = self.emergency_lock.lock().await;
        let mut transaction: PauseTransaction =
            read_json(self.store.as_ref(), &pending_key)
                .await?
                .ok_or_else(|| SentryError::NotFound(pending_key.clone()))?;
        transaction.resolve(decision, authority, now)?;

        match write_json_new(self.store.as_ref(), &resolved_key, &transaction).await {
            Ok(()) => {}
            // An earlier call recorded its decision but never cleared the
            // pending key. The recorded decision stands.
            Err(SentryError::AlreadyExists(_)) => {
                transaction = read_json(self.store.as_ref(), &resolved_key)
                    .await?
                    .ok_or_else(|| SentryError::NotFound(resolved_key.clone()))?;
                warn!(
                    "[{}] proposal {} already resolved as {}, clearing pending copy",
                    GOVERNOR_AGENT_ID,
                    stem,
                    transaction.status()
                );
            }
            Err(e) => return Err(e),
        }
        self.store.delete(&pending_key).await?;
        info!(
            "[{}] pause proposal {} {} by {}",
            GOVERNOR_AGENT_ID,
            stem,
            transaction.status(),
            authority
        );

        if transaction.status() == PauseStatus::Rejected
            && self.emergency_status().await? == EmergencyStatus::Active
            && self
                .store
                .list(keys::PENDING_PAUSE_PREFIX)
                .await?
                .is_empty()
        {
            self.write_emergency_state(
                EmergencyStatus::Standby,
                authority,
                Some(format!("proposal {stem} rejected")),
                now,
            )
            .await?;
        }

        Ok(PendingPause {
            key: resolved_key,
            transaction,
        })
    }

    pub async fn generate_report(&self, now: DateTime<Utc>) -> Result<GovernorReport> {
        let risk_status = self.get_risk_status(now).await;
        Ok(GovernorReport {
            risk_status,
            cross_chain_messages_verified: self.verified_message_count().await?,
            emergency_status: self.emergency_status().await?,
        })
    }
}
