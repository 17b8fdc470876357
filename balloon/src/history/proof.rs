use bincode::{Decode, Encode};
use tracing::debug;

use super::{
    DoubleTargetedCacheResolver, HistoryNavigator, IncrementalCacheResolver,
    SingleTargetedCacheResolver, VerifyIncrementalPruner, VerifyPruner,
    cache_resolver::CacheResolver, pruner::PruningContext,
};
use crate::{
    cache::AuditPath,
    error::Result,
    hashing::Hasher,
    proof::{decode_proof, encode_proof},
    visitor::ComputeHashVisitor,
};

/// Proof that the event at `index` is part of the history at `version`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MembershipProof {
    /// Digests of the subtrees off the path to the leaf
    pub audit_path: AuditPath,
    /// Leaf being proven
    pub index: u64,
    /// Version of the history the proof is against
    pub version: u64,
}

impl MembershipProof {
    /// Create a proof.
    pub fn new(audit_path: AuditPath, index: u64, version: u64) -> Self {
        Self {
            audit_path,
            index,
            version,
        }
    }

    /// Recompute the root at `version` with `event_digest` at `index` and
    /// compare it to `expected_digest`.
    pub fn verify(&self, hasher: &dyn Hasher, event_digest: &[u8], expected_digest: &[u8]) -> bool {
        debug!(
            index = self.index,
            version = self.version,
            "verifying history membership"
        );
        if self.index > self.version {
            return false;
        }

        let single;
        let double;
        let cache_resolver: &dyn CacheResolver = if self.index == self.version {
            single = SingleTargetedCacheResolver::new(self.version);
            &single
        } else {
            double = DoubleTargetedCacheResolver::new(self.index, self.version);
            &double
        };
        let context = PruningContext {
            navigator: HistoryNavigator::new(self.version),
            cache_resolver,
            cache: &self.audit_path,
        };

        let pruned = match VerifyPruner::new(event_digest, context).prune() {
            Ok(pruned) => pruned,
            Err(e) => {
                debug!(error = %e, "history membership proof rejected");
                return false;
            }
        };
        let recomputed = pruned.post_order(&mut ComputeHashVisitor::new(hasher));
        recomputed == expected_digest
    }

    /// Serialize this proof with bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        encode_proof(self, "history MembershipProof")
    }

    /// Deserialize a proof.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        decode_proof(bytes, "history MembershipProof")
    }
}

/// Proof that the history at `start_version` is a prefix of the history at
/// `end_version`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct IncrementalProof {
    /// Digests needed to rebuild both roots
    pub audit_path: AuditPath,
    /// Older version
    pub start_version: u64,
    /// Newer version
    pub end_version: u64,
}

impl IncrementalProof {
    /// Create a proof.
    pub fn new(audit_path: AuditPath, start_version: u64, end_version: u64) -> Self {
        Self {
            audit_path,
            start_version,
            end_version,
        }
    }

    /// Rebuild both roots out of the same audit path and compare them to the
    /// expected digests.
    pub fn verify(&self, hasher: &dyn Hasher, start_digest: &[u8], end_digest: &[u8]) -> bool {
        debug!(
            start = self.start_version,
            end = self.end_version,
            "verifying incremental proof"
        );
        if self.start_version > self.end_version {
            return false;
        }
        let cache_resolver = IncrementalCacheResolver::new(self.start_version, self.end_version);

        let recompute = |version: u64| {
            let context = PruningContext {
                navigator: HistoryNavigator::new(version),
                cache_resolver: &cache_resolver,
                cache: &self.audit_path,
            };
            VerifyIncrementalPruner::new(context)
                .prune()
                .map(|pruned| pruned.post_order(&mut ComputeHashVisitor::new(hasher)))
        };

        match (recompute(self.start_version), recompute(self.end_version)) {
            (Ok(start), Ok(end)) => start == start_digest && end == end_digest,
            (Err(e), _) | (_, Err(e)) => {
                debug!(error = %e, "incremental proof rejected");
                false
            }
        }
    }

    /// Serialize this proof with bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        encode_proof(self, "history IncrementalProof")
    }

    /// Deserialize a proof.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        decode_proof(bytes, "history IncrementalProof")
    }
}
