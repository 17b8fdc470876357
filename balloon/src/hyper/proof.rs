use bincode::{Decode, Encode};
use tracing::{debug, warn};

use super::{HyperNavigator, VerifyPruner};
use crate::{
    cache::AuditPath,
    error::Result,
    hashing::Hasher,
    proof::{decode_proof, encode_proof},
    visitor::SaltedHashVisitor,
};

/// Answer to a hyper tree lookup.
///
/// `value` holds the big-endian version stored for `key`, or `None` when the
/// key was never added, in which case the audit path is empty.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct QueryProof {
    /// Looked up key
    pub key: Vec<u8>,
    /// Stored value, absent for a non-member
    pub value: Option<Vec<u8>>,
    /// Digests of the subtrees off the path to the key
    pub audit_path: AuditPath,
}

impl QueryProof {
    /// Create a proof.
    pub fn new(key: Vec<u8>, value: Option<Vec<u8>>, audit_path: AuditPath) -> Self {
        Self {
            key,
            value,
            audit_path,
        }
    }

    /// Version at which the key was added, decoded from the value.
    pub fn actual_version(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.value.as_deref()?.try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }

    /// Check the proof for `key` against the hyper root `expected_digest`.
    ///
    /// An empty audit path is accepted as a proof of absence as long as no
    /// value is claimed. The audit path itself carries no integrity
    /// protection, so this holds only when proofs reach the verifier through
    /// an authenticated channel.
    pub fn verify(&self, hasher: &dyn Hasher, key: &[u8], expected_digest: &[u8]) -> bool {
        debug!(key = %hex::encode(key), "verifying hyper query proof");
        if key != self.key.as_slice() {
            warn!(
                proof_key = %hex::encode(&self.key),
                "hyper query proof is for another key"
            );
            return false;
        }
        if self.audit_path.is_empty() {
            return self.value.is_none();
        }
        let Some(value) = &self.value else {
            warn!("hyper query proof carries an audit path but no value");
            return false;
        };

        let navigator = HyperNavigator::new(hasher.bits());
        if key.len() != navigator.index_len() {
            warn!(len = key.len(), "hyper key has the wrong width for this hasher");
            return false;
        }

        let pruner = VerifyPruner::new(navigator, key.to_vec(), value.clone(), &self.audit_path);
        let pruned = match pruner.prune() {
            Ok(pruned) => pruned,
            Err(e) => {
                warn!(error = %e, "hyper query proof rejected");
                return false;
            }
        };
        let recomputed = pruned.post_order(&mut SaltedHashVisitor::new(hasher));
        if recomputed != expected_digest {
            warn!(
                recomputed = %hex::encode(&recomputed),
                expected = %hex::encode(expected_digest),
                "hyper root mismatch"
            );
            return false;
        }
        true
    }

    /// Serialize this proof with bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        encode_proof(self, "QueryProof")
    }

    /// Deserialize a proof.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        decode_proof(bytes, "QueryProof")
    }
}
