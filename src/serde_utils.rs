//! Serialization helpers shared by persisted records.
//!
//! Token amounts are raw integer units (18 decimals on most chains) and do
//! not fit a JSON number without precision loss, so they are written as
//! decimal strings.

use serde::{de, Deserialize, Deserializer, Serializer};

/// `u128` as a decimal string.
pub mod u128_string {
    use super::*;

    pub fn serialize<S>(val: &u128, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        raw.trim().parse::<u128>().map_err(de::Error::custom)
    }
}

/// `i128` as a decimal string.
pub mod i128_string {
    use super::*;

    pub fn serialize<S>(val: &i128, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<i128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(d)?;
        raw.trim().parse::<i128>().map_err(de::Error::custom)
    }
}

/// Object-store key fragment for a timestamp, sortable lexicographically.
pub fn timestamp_key(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y%m%dT%H%M%S%.3fZ").to_string()
}

/// Inverse of [`timestamp_key`].
pub fn parse_timestamp_key(key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::NaiveDateTime::parse_from_str(key, "%Y%m%dT%H%M%S%.3fZ")
        .ok()
        .map(|naive| naive.and_utc())
}
