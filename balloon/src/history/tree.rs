use std::sync::Arc;

use balloon_storage::{Mutation, Prefix};
use tracing::{debug, trace};

use super::{
    CacheResolver, DoubleTargetedCacheResolver, HistoryNavigator, IncrementalCacheResolver,
    IncrementalProof, InsertPruner, MembershipProof, PruningContext, SearchPruner,
    SingleTargetedCacheResolver,
};
use crate::{
    cache::{AuditPath, Cache},
    error::{BalloonError, Result},
    hashing::{Digest, Hasher},
    node::Visitable,
    position::Position,
    visitor::{AuditPathVisitor, CachingVisitor, ComputeHashVisitor, PrintVisitor},
};

/// Append-only Merkle tree over event digests in insertion order.
///
/// The tree itself is stateless: every call rebuilds the pruned tree it needs
/// out of `cache`, and additions hand their new digests back as mutations
/// for the caller to persist.
pub struct HistoryTree<C> {
    hasher: Arc<dyn Hasher>,
    cache: C,
}

impl<C: Cache> HistoryTree<C> {
    /// Create a tree reading settled digests from `cache`.
    pub fn new(hasher: Arc<dyn Hasher>, cache: C) -> Self {
        Self { hasher, cache }
    }

    /// Append `event_digest` as leaf `version`.
    ///
    /// Returns the new root digest and the
    /// [`Prefix::HistoryCache`] mutations persisting every digest settled by
    /// this addition.
    pub fn add(&self, event_digest: &[u8], version: u64) -> Result<(Digest, Vec<Mutation>)> {
        debug!(version, digest = %hex::encode(event_digest), "adding event to history tree");

        let resolver = SingleTargetedCacheResolver::new(version);
        let context = self.context(version, &resolver);
        let pruned = InsertPruner::new(version, event_digest, context).prune()?;
        self.trace_pruned(version, &pruned);

        let mut caching = CachingVisitor::new(ComputeHashVisitor::new(self.hasher.as_ref()));
        let root_digest = pruned.post_order(&mut caching);

        let mutations = caching
            .result()
            .into_iter()
            .map(|(pos, digest)| Mutation::new(Prefix::HistoryCache, pos.bytes(), digest))
            .collect::<Vec<_>>();
        trace!(mutations = mutations.len(), "history tree mutations");

        Ok((root_digest, mutations))
    }

    /// Prove that leaf `index` belongs to the tree at `version`.
    pub fn prove_membership(&self, index: u64, version: u64) -> Result<MembershipProof> {
        debug!(index, version, "proving history membership");
        if index > version {
            return Err(BalloonError::InvalidInput(format!(
                "index {index} is beyond version {version}"
            )));
        }

        let audit_path = if index == version {
            self.audit_path(version, &SingleTargetedCacheResolver::new(version))?
        } else {
            self.audit_path(version, &DoubleTargetedCacheResolver::new(index, version))?
        };
        Ok(MembershipProof::new(audit_path, index, version))
    }

    /// Prove that the tree at `start` is a prefix of the tree at `end`.
    pub fn prove_consistency(&self, start: u64, end: u64) -> Result<IncrementalProof> {
        debug!(start, end, "proving history consistency");
        if start > end {
            return Err(BalloonError::InvalidInput(format!(
                "start version {start} is greater than end version {end}"
            )));
        }

        let audit_path = self.audit_path(end, &IncrementalCacheResolver::new(start, end))?;
        Ok(IncrementalProof::new(audit_path, start, end))
    }

    fn context<'a>(
        &'a self,
        version: u64,
        cache_resolver: &'a dyn CacheResolver,
    ) -> PruningContext<'a, C> {
        PruningContext {
            navigator: HistoryNavigator::new(version),
            cache_resolver,
            cache: &self.cache,
        }
    }

    fn audit_path(&self, version: u64, cache_resolver: &dyn CacheResolver) -> Result<AuditPath> {
        let pruned = SearchPruner::new(self.context(version, cache_resolver)).prune()?;
        self.trace_pruned(version, &pruned);

        let mut visitor = AuditPathVisitor::new(ComputeHashVisitor::new(self.hasher.as_ref()));
        pruned.post_order(&mut visitor);
        Ok(visitor.result())
    }

    fn trace_pruned(&self, version: u64, pruned: &Visitable<super::HistoryPosition>) {
        if tracing::enabled!(tracing::Level::TRACE) {
            let mut printer = PrintVisitor::new(HistoryNavigator::new(version).depth());
            pruned.pre_order(&mut printer);
            trace!("pruned history tree:\n{}", printer.result());
        }
    }
}
