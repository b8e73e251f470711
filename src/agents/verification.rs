//! Cross-chain message verification strategies
//!
//! Only structural validation exists today. Verifier-network attestation
//! checks and nonce-gap / duplicate detection plug in as further
//! `VerificationStrategy` implementations.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::domain::CrossChainMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(String),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

#[async_trait]
pub trait VerificationStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn verify(&self, message: &CrossChainMessage) -> Verdict;
}

/// Shape checks only: a usable id and two distinct, known endpoints.
#[derive(Debug, Clone, Default)]
pub struct StructuralVerifier {
    /// Empty means any non-zero endpoint id is accepted.
    known_endpoints: BTreeSet<u32>,
}

impl StructuralVerifier {
    pub fn new(known_endpoints: impl IntoIterator<Item = u32>) -> Self {
        Self {
            known_endpoints: known_endpoints.into_iter().collect(),
        }
    }

    fn check(&self, message: &CrossChainMessage) -> Result<(), String> {
        let guid = message.guid.as_str();
        if guid.is_empty() {
            return Err("empty message id".to_string());
        }
        // The id becomes the audit key verbatim, whitespace included.
        if !guid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(format!("malformed message id {guid:?}"));
        }
        if message.src_eid == 0 || message.dst_eid == 0 {
            return Err("endpoint id must be non-zero".to_string());
        }
        if message.src_eid == message.dst_eid {
            return Err(format!(
                "source and destination are both endpoint {}",
                message.src_eid
            ));
        }
        if !self.known_endpoints.is_empty() {
            for eid in [message.src_eid, message.dst_eid] {
                if !self.known_endpoints.contains(&eid) {
                    return Err(format!("unknown endpoint {eid}"));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VerificationStrategy for StructuralVerifier {
    fn name(&self) -> &str {
        "structural"
    }

    async fn verify(&self, message: &CrossChainMessage) -> Verdict {
        match self.check(message) {
            Ok(()) => Verdict::Valid,
            Err(reason) => Verdict::Invalid(reason),
        }
    }
}
