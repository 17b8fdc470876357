use std::sync::Arc;

use balloon_storage::{Mutation, Prefix, Store};
use tracing::{debug, info, trace};

use super::{
    HyperNavigator, HyperPosition, InsertPruner, PruningContext, QueryProof, RebuildPruner,
    SearchPruner, SingleTargetedCacheResolver,
};
use crate::{
    cache::{AuditPath, ModifiableCache, SimpleCache},
    error::{BalloonError, Result},
    hashing::{Digest, Hasher},
    node::Visitable,
    position::Position,
    visitor::{AuditPathVisitor, CachingVisitor, PrintVisitor, SaltedHashVisitor},
};

/// Height at and below which hyper subtrees are recomputed from their leaves.
pub fn default_cache_level(num_bits: u16) -> u16 {
    num_bits.saturating_sub((num_bits / 10).max(2))
}

/// Sparse Merkle trie mapping event digests to the version they were added
/// at.
pub struct HyperTree<S> {
    hasher: Arc<dyn Hasher>,
    store: Arc<S>,
    pub(super) cache: SimpleCache,
    num_bits: u16,
    cache_level: u16,
    default_hashes: Vec<Digest>,
}

impl<S: Store> HyperTree<S> {
    /// Create a tree over `store`. `cache_level` defaults to
    /// [`default_cache_level`] of the hasher width.
    ///
    /// The in-memory cache starts empty; see [`HyperTree::warm_cache`].
    pub fn new(hasher: Arc<dyn Hasher>, store: Arc<S>, cache_level: Option<u16>) -> Result<Self> {
        let num_bits = hasher.bits();
        if num_bits == 0 || num_bits % 8 != 0 {
            return Err(BalloonError::InvalidInput(format!(
                "hasher width of {num_bits} bits is not a whole number of bytes"
            )));
        }
        let cache_level = cache_level.unwrap_or_else(|| default_cache_level(num_bits));
        if cache_level >= num_bits {
            return Err(BalloonError::InvalidInput(format!(
                "cache level {cache_level} must be below the tree depth {num_bits}"
            )));
        }

        let mut default_hashes = Vec::with_capacity(num_bits as usize);
        let zero: &[u8] = &[0];
        default_hashes.push(hasher.hash(&[zero, zero]));
        for height in 1..num_bits as usize {
            let below = &default_hashes[height - 1];
            default_hashes.push(hasher.hash(&[below.as_slice(), below.as_slice()]));
        }

        // one entry per node above the cache level
        let capacity = 1usize << (num_bits - cache_level).min(16);

        Ok(Self {
            hasher,
            store,
            cache: SimpleCache::new(capacity),
            num_bits,
            cache_level,
            default_hashes,
        })
    }

    /// Depth of the trie, equal to the hasher width in bits.
    pub fn num_bits(&self) -> u16 {
        self.num_bits
    }

    /// Effective cache level.
    pub fn cache_level(&self) -> u16 {
        self.cache_level
    }

    /// Digest of an empty subtree, indexed by height.
    pub fn default_hashes(&self) -> &[Digest] {
        &self.default_hashes
    }

    /// Load every persisted interior digest into memory.
    pub fn warm_cache(&self) -> Result<()> {
        self.cache.fill(self.store.as_ref(), Prefix::HyperCache)?;
        debug!(entries = self.cache.len()?, "hyper cache warmed");
        Ok(())
    }

    /// Recompute every interior digest above the cache level from the stored
    /// leaves, persist them and load them into memory.
    ///
    /// Recovers a tree whose [`Prefix::HyperCache`] entries were lost or
    /// never written. Returns the root digest over the stored leaves.
    pub fn rebuild_cache(&self) -> Result<Digest> {
        let leaves = self.store.get_all(Prefix::Index)?;
        info!(leaves = leaves.len(), "rebuilding hyper cache");

        let navigator = HyperNavigator::new(self.num_bits);
        let pruned =
            RebuildPruner::new(navigator, self.cache_level, &self.default_hashes, leaves).prune()?;
        self.trace_pruned(&pruned);

        let mut caching = CachingVisitor::new(SaltedHashVisitor::new(self.hasher.as_ref()));
        let root_digest = pruned.post_order(&mut caching);
        let mutations: Vec<Mutation> = caching
            .result()
            .into_iter()
            .map(|(pos, digest)| Mutation::new(Prefix::HyperCache, pos.bytes(), digest))
            .collect();

        self.store.mutate(mutations.clone())?;
        self.apply_cache(&mutations)?;
        info!(entries = mutations.len(), root = %hex::encode(&root_digest), "hyper cache rebuilt");
        Ok(root_digest)
    }

    /// Set the leaf `event_digest` to `version`.
    ///
    /// Returns the new root and the mutations persisting the leaf and every
    /// interior digest above the cache level on its path. The tree itself is
    /// left untouched; once the mutations are known to be committed,
    /// [`HyperTree::apply_cache`] brings the in-memory cache up to date.
    pub fn add(&self, event_digest: &[u8], version: u64) -> Result<(Digest, Vec<Mutation>)> {
        debug!(version, digest = %hex::encode(event_digest), "adding event to hyper tree");
        self.check_key(event_digest)?;

        let value = version.to_be_bytes().to_vec();
        let resolver = self.resolver(event_digest);
        let context = self.context(&resolver);
        let pruned = InsertPruner::new(event_digest.to_vec(), value.clone(), context).prune()?;
        self.trace_pruned(&pruned);

        let mut caching = CachingVisitor::new(SaltedHashVisitor::new(self.hasher.as_ref()));
        let root_digest = pruned.post_order(&mut caching);

        let mut mutations = vec![Mutation::new(Prefix::Index, event_digest.to_vec(), value)];
        mutations.extend(
            caching
                .result()
                .into_iter()
                .map(|(pos, digest)| Mutation::new(Prefix::HyperCache, pos.bytes(), digest)),
        );
        trace!(mutations = mutations.len(), "hyper tree mutations");

        Ok((root_digest, mutations))
    }

    /// Record the interior digests carried by committed `mutations`.
    pub fn apply_cache(&self, mutations: &[Mutation]) -> Result<()> {
        for mutation in mutations
            .iter()
            .filter(|m| m.prefix == Prefix::HyperCache)
        {
            self.cache.put(mutation.key.clone(), mutation.value.clone())?;
        }
        Ok(())
    }

    /// Prove the value stored for `key`, or its absence.
    pub fn query_membership(&self, key: &[u8]) -> Result<QueryProof> {
        debug!(key = %hex::encode(key), "querying hyper tree");
        self.check_key(key)?;

        let Some(value) = self.store.get(Prefix::Index, key)? else {
            return Ok(QueryProof::new(key.to_vec(), None, AuditPath::new()));
        };

        let resolver = self.resolver(key);
        let pruned = SearchPruner::new(self.context(&resolver)).prune()?;
        self.trace_pruned(&pruned);

        let mut visitor = AuditPathVisitor::new(SaltedHashVisitor::new(self.hasher.as_ref()));
        pruned.post_order(&mut visitor);
        Ok(QueryProof::new(key.to_vec(), Some(value), visitor.result()))
    }

    /// Check `proof` for `key` against `expected_digest` with this tree's
    /// hasher.
    pub fn verify_membership(
        &self,
        proof: &QueryProof,
        key: &[u8],
        expected_digest: &[u8],
    ) -> bool {
        proof.verify(self.hasher.as_ref(), key, expected_digest)
    }

    fn check_key(&self, key: &[u8]) -> Result<()> {
        let expected = HyperNavigator::new(self.num_bits).index_len();
        if key.len() != expected {
            return Err(BalloonError::InvalidInput(format!(
                "hyper key is {} bytes, expected {expected}",
                key.len()
            )));
        }
        Ok(())
    }

    fn resolver(&self, key: &[u8]) -> SingleTargetedCacheResolver {
        SingleTargetedCacheResolver::new(self.num_bits, self.cache_level, key.to_vec())
    }

    fn context<'a>(
        &'a self,
        cache_resolver: &'a SingleTargetedCacheResolver,
    ) -> PruningContext<'a, SimpleCache, S> {
        PruningContext {
            navigator: HyperNavigator::new(self.num_bits),
            cache_resolver,
            cache: &self.cache,
            store: self.store.as_ref(),
            default_hashes: &self.default_hashes,
        }
    }

    fn trace_pruned(&self, pruned: &Visitable<HyperPosition>) {
        if tracing::enabled!(tracing::Level::TRACE) {
            let mut printer = PrintVisitor::new(self.num_bits);
            pruned.pre_order(&mut printer);
            trace!("pruned hyper tree:\n{}", printer.result());
        }
    }
}
