//! JSON encoding on top of the raw object store.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::adapters::ObjectStore;
use crate::error::Result;

pub async fn read_json<T: DeserializeOwned>(store: &dyn ObjectStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Overwrite `key`.
pub async fn write_json<T: Serialize>(store: &dyn ObjectStore, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    store.put(key, bytes).await
}

/// Write-once: fails with `AlreadyExists` if `key` is taken.
pub async fn write_json_new<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    store.put_new(key, bytes).await
}
