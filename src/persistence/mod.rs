//! Persistence on top of the object store
//!
//! - Snapshot store for per-token supply snapshots
//! - Report store for operational reports and cycle error records
//! - Key layout shared with the API and the governor

pub mod json;
pub mod keys;
pub mod report_store;
pub mod snapshot_store;

pub use json::{read_json, write_json, write_json_new};
pub use report_store::{CycleErrorRecord, ReportStore};
pub use snapshot_store::SnapshotStore;
