//! Metric snapshot persistence
//!
//! One write-once object per token per sampling time, under
//! `supply-snapshots/{token}/{timestamp}.json`.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

use super::json::{read_json, write_json_new};
use super::keys;
use crate::adapters::ObjectStore;
use crate::domain::MetricSnapshot;
use crate::error::Result;

#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn ObjectStore>,
    tolerance: Duration,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn ObjectStore>, tolerance: Duration) -> Self {
        Self { store, tolerance }
    }

    pub async fn put(&self, snapshot: &MetricSnapshot) -> Result<String> {
        let key = keys::snapshot_key(&snapshot.token, snapshot.timestamp);
        write_json_new(self.store.as_ref(), &key, snapshot).await?;
        debug!("Persisted snapshot {}", key);
        Ok(key)
    }

    /// Snapshot closest to `target`, if one exists within the tolerance.
    /// Ties go to the earlier snapshot.
    pub async fn find_near(
        &self,
        token: &str,
        target: DateTime<Utc>,
    ) -> Result<Option<MetricSnapshot>> {
        let keys = self.store.list(&keys::snapshot_prefix(token)).await?;

        let best = keys
            .iter()
            .filter_map(|key| keys::timestamp_of(key).map(|ts| (key, ts)))
            .map(|(key, ts)| (key, distance(ts, target)))
            .filter(|(_, distance)| *distance <= self.tolerance)
            .min_by_key(|(_, distance)| *distance);

        match best {
            Some((key, _)) => read_json(self.store.as_ref(), key).await,
            None => Ok(None),
        }
    }

    /// Snapshot found at `now - 24h`.
    pub async fn find_day_ago(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MetricSnapshot>> {
        self.find_near(token, now - Duration::hours(24)).await
    }

    pub async fn latest(&self, token: &str) -> Result<Option<MetricSnapshot>> {
        let keys = self.store.list(&keys::snapshot_prefix(token)).await?;
        match keys.iter().rev().find(|k| keys::timestamp_of(k).is_some()) {
            Some(key) => read_json(self.store.as_ref(), key).await,
            None => Ok(None),
        }
    }
}

fn distance(a: DateTime<Utc>, b: DateTime<Utc>) -> Duration {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryObjectStore;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn snap(ts: DateTime<Utc>, amount: u128) -> MetricSnapshot {
        MetricSnapshot::build("gold", ts, &BTreeMap::from([(1, amount)]), None)
    }

    fn store() -> SnapshotStore {
        SnapshotStore::new(Arc::new(InMemoryObjectStore::new()), Duration::hours(2))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = store();
        let original = snap(at(1, 0), 987_654_321_987_654_321_987_654_321);
        store.put(&original).await.unwrap();

        let back = store.find_near("gold", at(1, 0)).await.unwrap().unwrap();
        assert_eq!(back, original);
    }

    #[tokio::test]
    async fn test_write_once() {
        let store = store();
        store.put(&snap(at(1, 0), 1)).await.unwrap();
        assert!(store.put(&snap(at(1, 0), 2)).await.is_err());
    }

    #[tokio::test]
    async fn test_find_day_ago_picks_closest_within_tolerance() {
        let store = store();
        store.put(&snap(at(1, 0), 10)).await.unwrap();
        store.put(&snap(at(1, 4), 20)).await.unwrap();
        store.put(&snap(at(1, 8), 30)).await.unwrap();

        let found = store.find_day_ago("gold", at(2, 5)).await.unwrap().unwrap();
        assert_eq!(found.total, 20);

        // 2026-03-02 15:00 - 24h = 03-01 15:00, nearest is 08:00 (7h away)
        assert!(store.find_day_ago("gold", at(2, 15)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_and_token_isolation() {
        let store = store();
        assert!(store.latest("gold").await.unwrap().is_none());

        store.put(&snap(at(1, 0), 10)).await.unwrap();
        store.put(&snap(at(1, 4), 20)).await.unwrap();
        assert_eq!(store.latest("gold").await.unwrap().unwrap().total, 20);
        assert!(store.latest("synthetic").await.unwrap().is_none());
    }
}
