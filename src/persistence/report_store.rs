//! Operational report persistence
//!
//! Each report is written once at `reports/{period}/{timestamp}.json` and the
//! `reports/latest.json` pointer is overwritten (last write wins). Cycle
//! failures leave an error record under `reports/errors/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::json::{read_json, write_json, write_json_new};
use super::keys;
use crate::adapters::ObjectStore;
use crate::domain::OperationalReport;
use crate::error::Result;

/// Record of a report cycle that did not complete cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub stage: String,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct ReportStore {
    store: Arc<dyn ObjectStore>,
}

impl ReportStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Persist the timestamped report, then move the latest pointer.
    pub async fn persist(&self, report: &OperationalReport) -> Result<String> {
        let key = keys::report_key(&report.period, report.timestamp);
        write_json_new(self.store.as_ref(), &key, report).await?;
        write_json(self.store.as_ref(), keys::LATEST_REPORT_KEY, report).await?;
        info!("Persisted report {}", key);
        Ok(key)
    }

    pub async fn latest(&self) -> Result<Option<OperationalReport>> {
        read_json(self.store.as_ref(), keys::LATEST_REPORT_KEY).await
    }

    pub async fn get(&self, key: &str) -> Result<Option<OperationalReport>> {
        read_json(self.store.as_ref(), key).await
    }

    pub async fn persist_error(&self, record: &CycleErrorRecord) -> Result<String> {
        let key = keys::error_key(record.timestamp);
        write_json_new(self.store.as_ref(), &key, record).await?;
        Ok(key)
    }

    pub async fn errors(&self) -> Result<Vec<CycleErrorRecord>> {
        let mut records = Vec::new();
        for key in self.store.list(keys::ERROR_PREFIX).await? {
            if let Some(record) = read_json(self.store.as_ref(), &key).await? {
                records.push(record);
            }
        }
        Ok(records)
    }
}
