//! Object-store key layout.

use chrono::{DateTime, Utc};

use crate::serde_utils::timestamp_key;

pub const SNAPSHOT_PREFIX: &str = "supply-snapshots/";
pub const REPORT_PREFIX: &str = "reports/";
pub const LATEST_REPORT_KEY: &str = "reports/latest.json";
pub const ERROR_PREFIX: &str = "reports/errors/";
pub const PENDING_PAUSE_PREFIX: &str = "emergency/pending/";
pub const RESOLVED_PAUSE_PREFIX: &str = "emergency/resolved/";
pub const EMERGENCY_STATUS_KEY: &str = "emergency/status.json";
pub const CROSSCHAIN_PREFIX: &str = "crosschain/";
pub const REVIEW_PREFIX: &str = "skill-prs/";

pub fn snapshot_prefix(token: &str) -> String {
    format!("{SNAPSHOT_PREFIX}{token}/")
}

pub fn snapshot_key(token: &str, ts: DateTime<Utc>) -> String {
    format!("{}{}.json", snapshot_prefix(token), timestamp_key(ts))
}

pub fn report_key(period: &str, ts: DateTime<Utc>) -> String {
    format!("{REPORT_PREFIX}{period}/{}.json", timestamp_key(ts))
}

pub fn error_key(ts: DateTime<Utc>) -> String {
    format!("{ERROR_PREFIX}{}.json", timestamp_key(ts))
}

pub fn pending_pause_key(ts: DateTime<Utc>) -> String {
    format!("{PENDING_PAUSE_PREFIX}{}.json", timestamp_key(ts))
}

/// Timestamp fragment of a `.../{timestamp}.json` key.
pub fn timestamp_of(key: &str) -> Option<DateTime<Utc>> {
    let file = key.rsplit('/').next()?;
    let stem = file.strip_suffix(".json")?;
    crate::serde_utils::parse_timestamp_key(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_key_layout() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(
            snapshot_key("gold", ts),
            "supply-snapshots/gold/20260301T080000.000Z.json"
        );
        assert_eq!(report_key("4h", ts), "reports/4h/20260301T080000.000Z.json");
        assert_eq!(
            pending_pause_key(ts),
            "emergency/pending/20260301T080000.000Z.json"
        );
        assert_eq!(timestamp_of(&snapshot_key("gold", ts)), Some(ts));
        assert_eq!(timestamp_of(LATEST_REPORT_KEY), None);
    }
}
