//! Scheduled report cycle
//!
//! One tick: refresh every token agent, aggregate through the governor,
//! persist the operational report, post the summary to operations and page
//! the escalation route for HIGH / CRITICAL alerts.
//!
//! A tick never returns an error. Failures are collected into the
//! [`CycleOutcome`], persisted as an error record and announced on the
//! operations channel.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::agents::{Governor, ObserverAgent, PendingPause, TokenRiskAgent, GOVERNOR_AGENT_ID};
use crate::domain::{
    AgentReport, Alert, AlertSeverity, AlertType, EmergencyStatus, GovernorReport,
    OperationalReport, RiskLevel,
};
use crate::error::Result;
use crate::persistence::{CycleErrorRecord, ReportStore};
use crate::supervisor::{
    escalated, escalation_policy, policy_for, ChannelId, DispatchResult, NotificationDispatcher,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Monitoring switched off; nothing ran.
    Disabled,
    Completed,
    /// Report produced and persisted, but some step degraded.
    PartialFailure,
    /// The report could not be persisted.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleOutcome {
    pub status: CycleStatus,
    pub timestamp: DateTime<Utc>,
    pub report_key: Option<String>,
    pub overall: Option<RiskLevel>,
    pub alert_count: usize,
    pub escalated_count: usize,
    pub errors: Vec<String>,
    pub notifications: Vec<DispatchResult>,
    /// The assembled report, persisted or not.
    #[serde(skip)]
    pub report: Option<OperationalReport>,
}

/// A stored pause proposal and the announcement sent for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedPause {
    #[serde(flatten)]
    pub pending: PendingPause,
    pub alert: Alert,
    pub notifications: Vec<DispatchResult>,
}

impl CycleOutcome {
    fn disabled(timestamp: DateTime<Utc>) -> Self {
        Self {
            status: CycleStatus::Disabled,
            timestamp,
            report_key: None,
            overall: None,
            alert_count: 0,
            escalated_count: 0,
            errors: Vec::new(),
            notifications: Vec::new(),
            report: None,
        }
    }
}

pub struct ReportCycle {
    enabled: bool,
    period: String,
    governor: Arc<Governor>,
    observer: Arc<ObserverAgent>,
    reports: ReportStore,
    dispatcher: Arc<NotificationDispatcher>,
    last_outcome: RwLock<Option<CycleOutcome>>,
}

impl ReportCycle {
    pub fn new(
        enabled: bool,
        period: &str,
        governor: Arc<Governor>,
        observer: Arc<ObserverAgent>,
        reports: ReportStore,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            enabled,
            period: period.to_string(),
            governor,
            observer,
            reports,
            dispatcher,
            last_outcome: RwLock::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn period(&self) -> &str {
        &self.period
    }

    pub fn governor(&self) -> &Arc<Governor> {
        &self.governor
    }

    pub fn reports(&self) -> &ReportStore {
        &self.reports
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }

    /// Outcome of the most recent tick in this process.
    pub async fn last_outcome(&self) -> Option<CycleOutcome> {
        self.last_outcome.read().await.clone()
    }

    /// Store a pause proposal through the governor, then page every channel
    /// on the RED route with a CRITICAL emergency alert.
    ///
    /// The proposal is kept even when every send fails.
    pub async fn prepare_emergency_pause(
        &self,
        target: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<PreparedPause> {
        let pending = self
            .governor
            .prepare_emergency_pause(target, reason, now)
            .await?;

        let alert = Alert::new(
            AlertType::Emergency,
            AlertSeverity::Critical,
            GOVERNOR_AGENT_ID,
            format!("pause of {target} prepared, awaiting approval: {reason}"),
            now,
        )
        .with_payload(serde_json::json!({
            "key": pending.key,
            "target": target,
            "reason": reason,
        }));

        let policy = policy_for(RiskLevel::Red);
        let mut message = format!(
            "\u{1f6d1} EMERGENCY PAUSE PREPARED ({})",
            now.format("%Y-%m-%d %H:%M UTC")
        );
        let tags: Vec<String> = policy.recipients.iter().map(|r| format!("@{r}")).collect();
        let _ = write!(message, "\nAttention: {}", tags.join(" "));
        let _ = write!(message, "\n{}", alert.format_line());
        let _ = write!(message, "\nProposal: {}", pending.key);
        message.push_str("\nNothing is executed until the approval authority signs.");

        let notifications = self.dispatcher.broadcast(policy.channels, &message).await;
        let delivered = notifications.iter().filter(|n| n.success).count();
        if delivered == 0 {
            error!("Pause proposal {} was not delivered to any channel", pending.key);
        } else {
            info!(
                "Pause proposal {} announced on {} destination(s)",
                pending.key, delivered
            );
        }

        Ok(PreparedPause {
            pending,
            alert,
            notifications,
        })
    }

    pub async fn run_tick(&self, now: DateTime<Utc>) -> CycleOutcome {
        let outcome = self.execute(now).await;
        *self.last_outcome.write().await = Some(outcome.clone());
        outcome
    }

    async fn execute(&self, now: DateTime<Utc>) -> CycleOutcome {
        if !self.enabled {
            info!("Ecosystem monitoring disabled, skipping report cycle");
            return CycleOutcome::disabled(now);
        }

        info!("Starting {} report cycle at {}", self.period, now);
        let mut errors = Vec::new();
        let mut notifications = Vec::new();

        let agents = self.collect_agent_reports(now, &mut errors).await;

        let governor = match self.governor.generate_report(now).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Governor report degraded: {}", e);
                errors.push(format!("governor: {e}"));
                GovernorReport {
                    risk_status: self.governor.get_risk_status(now).await,
                    cross_chain_messages_verified: 0,
                    emergency_status: EmergencyStatus::default(),
                }
            }
        };
        let observer = self.observer.generate_report(now).await;

        let report = OperationalReport::new(now, &self.period, agents, governor, observer);

        let report_key = match self.reports.persist(&report).await {
            Ok(key) => Some(key),
            Err(e) => {
                error!("Failed to persist report: {}", e);
                errors.push(format!("persist report: {e}"));
                None
            }
        };

        notifications.extend(
            self.dispatcher
                .send(ChannelId::Operations, &report.summary)
                .await,
        );

        let escalations = escalated(report.alerts());
        let escalated_count = escalations.len();
        if let Some(policy) = escalation_policy(report.alerts(), report.overall()) {
            warn!(
                "{} alert(s) at HIGH or above, escalating to {:?}",
                escalated_count, policy.channels
            );
            let message = format_escalation(&report, policy.recipients, policy.requires_ack);
            notifications.extend(self.dispatcher.broadcast(policy.channels, &message).await);
        }

        // Skipped bindings are configuration, not failures.
        for n in notifications.iter().filter(|n| !n.success && !n.skipped) {
            errors.push(format!(
                "notify {} via {}: {}",
                n.channel,
                n.transport,
                n.error.as_deref().unwrap_or("unknown error")
            ));
        }

        let status = if report_key.is_none() {
            CycleStatus::Failed
        } else if errors.is_empty() {
            CycleStatus::Completed
        } else {
            CycleStatus::PartialFailure
        };

        if !errors.is_empty() {
            self.record_failure(now, status, &errors, &mut notifications)
                .await;
        }

        info!(
            "Report cycle finished: {:?}, overall {}, {} alert(s), {} error(s)",
            status,
            report.overall(),
            report.alerts().len(),
            errors.len()
        );

        CycleOutcome {
            status,
            timestamp: now,
            report_key,
            overall: Some(report.overall()),
            alert_count: report.alerts().len(),
            escalated_count,
            errors,
            notifications,
            report: Some(report),
        }
    }

    /// Refresh then report, for every agent concurrently. Result order is
    /// agent order.
    async fn collect_agent_reports(
        &self,
        now: DateTime<Utc>,
        errors: &mut Vec<String>,
    ) -> Vec<AgentReport> {
        let results = join_all(
            self.governor
                .agents()
                .iter()
                .map(|agent| refresh_and_report(agent.as_ref(), now)),
        )
        .await;

        let mut reports = Vec::with_capacity(results.len());
        for (report, agent_errors) in results {
            errors.extend(agent_errors);
            reports.push(report);
        }
        reports
    }

    async fn record_failure(
        &self,
        now: DateTime<Utc>,
        status: CycleStatus,
        errors: &[String],
        notifications: &mut Vec<DispatchResult>,
    ) {
        let record = CycleErrorRecord {
            timestamp: now,
            stage: format!("{status:?}"),
            errors: errors.to_vec(),
        };
        match self.reports.persist_error(&record).await {
            Ok(key) => debug!("Error record stored at {}", key),
            Err(e) => error!("Failed to persist error record: {}", e),
        }

        if status == CycleStatus::Failed {
            let mut notice = format!(
                "\u{26a0}\u{fe0f} {} report cycle at {} failed",
                self.period,
                now.format("%Y-%m-%d %H:%M UTC")
            );
            for e in errors {
                let _ = write!(notice, "\n- {e}");
            }
            notifications.extend(self.dispatcher.send(ChannelId::Operations, &notice).await);
        }
    }
}

async fn refresh_and_report(
    agent: &dyn TokenRiskAgent,
    now: DateTime<Utc>,
) -> (AgentReport, Vec<String>) {
    let mut errors = Vec::new();
    match agent.refresh_snapshot(now).await {
        Ok(refresh) => {
            if let Some(e) = refresh.storage_error {
                errors.push(format!("agent {}: snapshot storage: {e}", agent.id()));
            }
        }
        Err(e) => {
            warn!("[{}] snapshot refresh failed: {}", agent.id(), e);
            errors.push(format!("agent {}: snapshot refresh: {e}", agent.id()));
        }
    }
    (agent.generate_report(now).await, errors)
}

fn format_escalation(report: &OperationalReport, recipients: &[&str], requires_ack: bool) -> String {
    let alerts = escalated(report.alerts());
    let mut out = format!(
        "\u{1f6a8} ESCALATION: {} alert(s) at HIGH or above ({})",
        alerts.len(),
        report.timestamp.format("%Y-%m-%d %H:%M UTC")
    );
    if !recipients.is_empty() {
        let tags: Vec<String> = recipients.iter().map(|r| format!("@{r}")).collect();
        let _ = write!(out, "\nAttention: {}", tags.join(" "));
    }
    if requires_ack {
        out.push_str("\nAcknowledgement required");
    }
    for alert in alerts {
        let _ = write!(out, "\n{}", alert.format_line());
    }
    out
}
