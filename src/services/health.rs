//! Health reporting for process supervision
//!
//! Storage reachability, notification configuration and the most recent
//! report cycle, folded into one status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::report_cycle::{CycleOutcome, CycleStatus, ReportCycle};
use crate::adapters::ObjectStore;
use crate::persistence::keys;

/// Health status for a component. Variant order is severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    fn new(name: &str, status: HealthStatus, message: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub monitoring_enabled: bool,
    pub components: Vec<ComponentHealth>,
}

pub async fn check_health(
    cycle: &ReportCycle,
    store: &dyn ObjectStore,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> HealthResponse {
    let configured = cycle
        .dispatcher()
        .bindings()
        .iter()
        .filter(|b| b.destination.is_some() && b.transport.is_configured())
        .count();

    let components = vec![
        storage_health(store).await,
        notification_health(configured),
        cycle_health(cycle.last_outcome().await.as_ref()),
    ];

    HealthResponse {
        status: fold_status(&components),
        timestamp: now,
        uptime_seconds: (now - started_at).num_seconds().max(0) as u64,
        monitoring_enabled: cycle.is_enabled(),
        components,
    }
}

/// Lists the small `emergency/` tree, so the check stays cheap on a file store.
async fn storage_health(store: &dyn ObjectStore) -> ComponentHealth {
    match store.list(keys::EMERGENCY_STATUS_KEY).await {
        Ok(_) => ComponentHealth::new("storage", HealthStatus::Healthy, None),
        Err(e) => ComponentHealth::new("storage", HealthStatus::Unhealthy, Some(e.to_string())),
    }
}

fn notification_health(configured: usize) -> ComponentHealth {
    if configured == 0 {
        ComponentHealth::new(
            "notifications",
            HealthStatus::Degraded,
            Some("no chat transport configured".to_string()),
        )
    } else {
        ComponentHealth::new(
            "notifications",
            HealthStatus::Healthy,
            Some(format!("{configured} destination(s)")),
        )
    }
}

fn cycle_health(outcome: Option<&CycleOutcome>) -> ComponentHealth {
    let Some(outcome) = outcome else {
        return ComponentHealth::new(
            "report_cycle",
            HealthStatus::Healthy,
            Some("no cycle run yet".to_string()),
        );
    };
    let status = match outcome.status {
        CycleStatus::Completed | CycleStatus::Disabled => HealthStatus::Healthy,
        CycleStatus::PartialFailure => HealthStatus::Degraded,
        CycleStatus::Failed => HealthStatus::Unhealthy,
    };
    ComponentHealth::new(
        "report_cycle",
        status,
        Some(format!("{:?} at {}", outcome.status, outcome.timestamp)),
    )
}

/// The worst component status.
fn fold_status(components: &[ComponentHealth]) -> HealthStatus {
    components
        .iter()
        .map(|c| c.status)
        .max()
        .unwrap_or(HealthStatus::Healthy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryObjectStore;
    use crate::error::{Result, SentryError};
    use async_trait::async_trait;
    use chrono::TimeZone;

    /// Store that fails every call.
    struct DownStore;

    #[async_trait]
    impl ObjectStore for DownStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(SentryError::Storage("unreachable".to_string()))
        }
        async fn put(&self, _key: &str, _value: Vec<u8>) -> Result<()> {
            Err(SentryError::Storage("unreachable".to_string()))
        }
        async fn put_new(&self, _key: &str, _value: Vec<u8>) -> Result<()> {
            Err(SentryError::Storage("unreachable".to_string()))
        }
        async fn list(&self, _prefix: &str) -> Result<Vec<String>> {
            Err(SentryError::Storage("unreachable".to_string()))
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            Err(SentryError::Storage("unreachable".to_string()))
        }
    }

    fn outcome(status: CycleStatus) -> CycleOutcome {
        CycleOutcome {
            status,
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            report_key: None,
            overall: None,
            alert_count: 0,
            escalated_count: 0,
            errors: Vec::new(),
            notifications: Vec::new(),
            report: None,
        }
    }

    #[tokio::test]
    async fn test_storage_health_follows_listing() {
        let ok = storage_health(&InMemoryObjectStore::new()).await;
        assert_eq!(ok.status, HealthStatus::Healthy);

        let down = storage_health(&DownStore).await;
        assert_eq!(down.status, HealthStatus::Unhealthy);
        assert!(down.message.unwrap().contains("unreachable"));
    }

    #[test]
    fn test_cycle_status_mapping() {
        assert_eq!(cycle_health(None).status, HealthStatus::Healthy);
        for (status, expected) in [
            (CycleStatus::Disabled, HealthStatus::Healthy),
            (CycleStatus::Completed, HealthStatus::Healthy),
            (CycleStatus::PartialFailure, HealthStatus::Degraded),
            (CycleStatus::Failed, HealthStatus::Unhealthy),
        ] {
            assert_eq!(cycle_health(Some(&outcome(status))).status, expected);
        }
    }

    #[test]
    fn test_fold_takes_worst_component() {
        let healthy = ComponentHealth::new("storage", HealthStatus::Healthy, None);
        assert_eq!(fold_status(&[]), HealthStatus::Healthy);
        assert_eq!(fold_status(&[healthy.clone()]), HealthStatus::Healthy);

        // No transport configured degrades an otherwise healthy process.
        let degraded = [healthy.clone(), notification_health(0)];
        assert_eq!(fold_status(&degraded), HealthStatus::Degraded);

        let unhealthy = [
            notification_health(0),
            cycle_health(Some(&outcome(CycleStatus::Failed))),
            healthy,
        ];
        assert_eq!(fold_status(&unhealthy), HealthStatus::Unhealthy);
    }
}
