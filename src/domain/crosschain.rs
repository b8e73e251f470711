use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message claimed to have been relayed between two chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossChainMessage {
    pub guid: String,
    /// Source endpoint id.
    pub src_eid: u32,
    /// Destination endpoint id.
    pub dst_eid: u32,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_hash: Option<String>,
}

impl CrossChainMessage {
    /// Object-store key of the audit record.
    pub fn audit_key(&self) -> String {
        format!(
            "{}{}-{}/{}.json",
            crate::persistence::keys::CROSSCHAIN_PREFIX,
            self.src_eid,
            self.dst_eid,
            self.guid
        )
    }
}

/// Audit record persisted for every message that passed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedMessage {
    pub message: CrossChainMessage,
    pub verified_at: DateTime<Utc>,
    pub strategy: String,
}
