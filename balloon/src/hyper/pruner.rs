//! Builders of minimal hyper trees.
//!
//! Above the cache level the pruners descend one node at a time, splitting
//! the in-memory leaves at the right child's first key. Once a subtree falls
//! to the cache level, a single range scan fetches every stored leaf under
//! it, the leaves of the operation are merged in, and the rest of the
//! subtree is built in memory.

use balloon_storage::{KVPair, KVRange, Prefix, Store, split_at_key};

use super::{HyperNavigator, HyperPosition, SingleTargetedCacheResolver};
use crate::{
    cache::Cache,
    error::{BalloonError, Result},
    hashing::Digest,
    node::Visitable,
};

type Pruned = Visitable<HyperPosition>;

/// Parameters shared by the server-side hyper pruners.
pub struct PruningContext<'a, C, S: ?Sized> {
    /// Navigator over the whole trie
    pub navigator: HyperNavigator,
    /// Traversal policy for the target key
    pub cache_resolver: &'a SingleTargetedCacheResolver,
    /// Digests above the cache level
    pub cache: &'a C,
    /// Leaves below the cache level
    pub store: &'a S,
    /// Digest of an empty subtree, by height
    pub default_hashes: &'a [Digest],
}

fn default_hash(default_hashes: &[Digest], pos: &HyperPosition) -> Result<Digest> {
    default_hashes
        .get(pos.height as usize)
        .cloned()
        .ok_or_else(|| {
            BalloonError::InvalidInput(format!("no default hash for height {}", pos.height))
        })
}

fn children(
    navigator: &HyperNavigator,
    pos: &HyperPosition,
) -> Result<(HyperPosition, HyperPosition)> {
    match (navigator.go_to_left(pos), navigator.go_to_right(pos)) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(BalloonError::InvalidInput(format!(
            "hyper position {} has no children",
            hex::encode(&pos.index)
        ))),
    }
}

fn join(navigator: &HyperNavigator, pos: HyperPosition, left: Pruned, right: Pruned) -> Pruned {
    if navigator.is_root(&pos) {
        Visitable::root(pos, left, right)
    } else {
        Visitable::node(pos, left, right)
    }
}

fn broken_split(pos: &HyperPosition, leaves: &[KVPair]) -> BalloonError {
    BalloonError::InvalidInput(format!(
        "{} leaves reached single leaf {}, keys are unsorted or of the wrong width",
        leaves.len(),
        hex::encode(&pos.index)
    ))
}

impl<C: Cache, S: Store + ?Sized> PruningContext<'_, C, S> {
    fn cached_or_default(&self, pos: &HyperPosition) -> Result<Pruned> {
        let digest = match self.cache.get(pos)? {
            Some(digest) => digest,
            None => default_hash(self.default_hashes, pos)?,
        };
        Ok(Visitable::cached(pos.clone(), digest))
    }

    /// Every stored leaf under `pos` merged with `leaves`.
    fn leaves_below(&self, pos: &HyperPosition, leaves: &[KVPair]) -> Result<KVRange> {
        let first = self.navigator.descend_to_first(pos);
        let last = self.navigator.descend_to_last(pos);
        let mut range = self
            .store
            .get_range(Prefix::Index, &first.index, &last.index)?;
        for leaf in leaves {
            range.insert_sorted(leaf.clone());
        }
        Ok(range)
    }

    fn traverse_without_cache(&self, pos: &HyperPosition, leaves: &[KVPair]) -> Result<Pruned> {
        build_from_leaves(&self.navigator, self.default_hashes, pos, leaves)
    }
}

/// Build the subtree at `pos` out of `leaves` alone.
fn build_from_leaves(
    navigator: &HyperNavigator,
    default_hashes: &[Digest],
    pos: &HyperPosition,
    leaves: &[KVPair],
) -> Result<Pruned> {
    if navigator.is_leaf(pos) && leaves.len() == 1 {
        return Ok(Visitable::leaf(pos.clone(), leaves[0].value.clone()));
    }
    if !navigator.is_root(pos) && leaves.is_empty() {
        return Ok(Visitable::cached(pos.clone(), default_hash(default_hashes, pos)?));
    }
    if navigator.is_leaf(pos) {
        return Err(broken_split(pos, leaves));
    }

    let (left_pos, right_pos) = children(navigator, pos)?;
    let (left_leaves, right_leaves) = split_at_key(leaves, &right_pos.index);
    let left = build_from_leaves(navigator, default_hashes, &left_pos, left_leaves)?;
    let right = build_from_leaves(navigator, default_hashes, &right_pos, right_leaves)?;
    Ok(join(navigator, pos.clone(), left, right))
}

/// Builds the tree needed to set the leaf `key` to `value`.
///
/// Nodes on the path above the cache level are wrapped
/// [`Visitable::Collectable`] so their new digests get persisted.
pub struct InsertPruner<'a, C, S: ?Sized> {
    leaf: KVPair,
    context: PruningContext<'a, C, S>,
}

impl<'a, C: Cache, S: Store + ?Sized> InsertPruner<'a, C, S> {
    /// Pruner storing `value` under `key`.
    pub fn new(key: Vec<u8>, value: Vec<u8>, context: PruningContext<'a, C, S>) -> Self {
        Self {
            leaf: KVPair::new(key, value),
            context,
        }
    }

    /// Build the pruned tree.
    pub fn prune(&self) -> Result<Pruned> {
        let leaves = [self.leaf.clone()];
        self.traverse(&self.context.navigator.root(), &leaves)
    }

    fn traverse(&self, pos: &HyperPosition, leaves: &[KVPair]) -> Result<Pruned> {
        let ctx = &self.context;
        if ctx.cache_resolver.should_be_in_cache(pos) {
            return ctx.cached_or_default(pos);
        }
        if !ctx.cache_resolver.should_cache(pos) {
            let range = ctx.leaves_below(pos, leaves)?;
            return ctx.traverse_without_cache(pos, &range);
        }

        let (left_pos, right_pos) = children(&ctx.navigator, pos)?;
        let (left_leaves, right_leaves) = split_at_key(leaves, &right_pos.index);
        let left = self.traverse(&left_pos, left_leaves)?;
        let right = self.traverse(&right_pos, right_leaves)?;
        if ctx.navigator.is_root(pos) {
            return Ok(Visitable::root(pos.clone(), left, right));
        }
        Ok(Visitable::collectable(Visitable::node(pos.clone(), left, right)))
    }
}

/// Builds the tree from which a query proof's audit path is collected.
///
/// Every subtree hanging off the path to the target key is wrapped
/// collectable, whether its digest came from the cache or was rebuilt from
/// its leaves.
pub struct SearchPruner<'a, C, S: ?Sized> {
    context: PruningContext<'a, C, S>,
}

impl<'a, C: Cache, S: Store + ?Sized> SearchPruner<'a, C, S> {
    /// Pruner over `context`.
    pub fn new(context: PruningContext<'a, C, S>) -> Self {
        Self { context }
    }

    /// Build the pruned tree.
    pub fn prune(&self) -> Result<Pruned> {
        self.traverse_cache(&self.context.navigator.root(), &[])
    }

    fn traverse_cache(&self, pos: &HyperPosition, leaves: &[KVPair]) -> Result<Pruned> {
        let ctx = &self.context;
        if ctx.cache_resolver.should_be_in_cache(pos) {
            return Ok(Visitable::collectable(ctx.cached_or_default(pos)?));
        }
        if !ctx.cache_resolver.should_cache(pos) {
            let range = ctx.leaves_below(pos, leaves)?;
            return self.traverse(pos, &range);
        }

        let (left_pos, right_pos) = children(&ctx.navigator, pos)?;
        let (left_leaves, right_leaves) = split_at_key(leaves, &right_pos.index);
        let left = self.traverse_cache(&left_pos, left_leaves)?;
        let right = self.traverse_cache(&right_pos, right_leaves)?;
        Ok(join(&ctx.navigator, pos.clone(), left, right))
    }

    fn traverse(&self, pos: &HyperPosition, leaves: &[KVPair]) -> Result<Pruned> {
        let ctx = &self.context;
        if ctx.navigator.is_leaf(pos) && leaves.len() == 1 {
            let leaf = Visitable::leaf(pos.clone(), leaves[0].value.clone());
            if !ctx.cache_resolver.is_on_path(pos) {
                return Ok(Visitable::collectable(leaf));
            }
            return Ok(leaf);
        }
        if !ctx.navigator.is_root(pos) && leaves.is_empty() {
            let cached = Visitable::cached(pos.clone(), default_hash(ctx.default_hashes, pos)?);
            return Ok(Visitable::collectable(cached));
        }
        if ctx.navigator.is_leaf(pos) {
            return Err(broken_split(pos, leaves));
        }

        let (left_pos, right_pos) = children(&ctx.navigator, pos)?;
        let (left_leaves, right_leaves) = split_at_key(leaves, &right_pos.index);

        if !ctx.cache_resolver.is_on_path(pos) {
            let left = ctx.traverse_without_cache(&left_pos, left_leaves)?;
            let right = ctx.traverse_without_cache(&right_pos, right_leaves)?;
            let node = join(&ctx.navigator, pos.clone(), left, right);
            if ctx.navigator.is_root(pos) {
                return Ok(node);
            }
            return Ok(Visitable::collectable(node));
        }

        let left = self.traverse(&left_pos, left_leaves)?;
        let right = self.traverse(&right_pos, right_leaves)?;
        Ok(join(&ctx.navigator, pos.clone(), left, right))
    }
}

/// Builds the whole trie out of every stored leaf, ignoring persisted
/// interior digests.
///
/// Non-empty nodes above the cache level are wrapped
/// [`Visitable::Collectable`] so their digests can be written back. Empty
/// subtrees collapse to their default hash and are left out.
pub struct RebuildPruner<'a> {
    navigator: HyperNavigator,
    cache_level: u16,
    default_hashes: &'a [Digest],
    leaves: KVRange,
}

impl<'a> RebuildPruner<'a> {
    /// Pruner over `leaves`, which must hold every stored leaf.
    pub fn new(
        navigator: HyperNavigator,
        cache_level: u16,
        default_hashes: &'a [Digest],
        leaves: KVRange,
    ) -> Self {
        Self {
            navigator,
            cache_level,
            default_hashes,
            leaves,
        }
    }

    /// Build the pruned tree.
    pub fn prune(&self) -> Result<Pruned> {
        self.traverse(&self.navigator.root(), &self.leaves)
    }

    fn traverse(&self, pos: &HyperPosition, leaves: &[KVPair]) -> Result<Pruned> {
        if pos.height <= self.cache_level {
            return build_from_leaves(&self.navigator, self.default_hashes, pos, leaves);
        }
        if !self.navigator.is_root(pos) && leaves.is_empty() {
            return Ok(Visitable::cached(pos.clone(), default_hash(self.default_hashes, pos)?));
        }

        let (left_pos, right_pos) = children(&self.navigator, pos)?;
        let (left_leaves, right_leaves) = split_at_key(leaves, &right_pos.index);
        let left = self.traverse(&left_pos, left_leaves)?;
        let right = self.traverse(&right_pos, right_leaves)?;
        if self.navigator.is_root(pos) {
            return Ok(Visitable::root(pos.clone(), left, right));
        }
        Ok(Visitable::collectable(Visitable::node(pos.clone(), left, right)))
    }
}

/// Rebuilds, on the verifier side, the tree a query proof describes. Every
/// subtree off the path must come from the audit path.
pub struct VerifyPruner<'a, C> {
    navigator: HyperNavigator,
    leaf: KVPair,
    cache: &'a C,
}

impl<'a, C: Cache> VerifyPruner<'a, C> {
    /// Pruner placing `value` at `key`, reading siblings from `cache`.
    pub fn new(navigator: HyperNavigator, key: Vec<u8>, value: Vec<u8>, cache: &'a C) -> Self {
        Self {
            navigator,
            leaf: KVPair::new(key, value),
            cache,
        }
    }

    /// Build the pruned tree. Fails with [`BalloonError::InvalidProof`] when
    /// a sibling digest is missing.
    pub fn prune(&self) -> Result<Pruned> {
        let leaves = [self.leaf.clone()];
        self.traverse(&self.navigator.root(), &leaves)
    }

    fn traverse(&self, pos: &HyperPosition, leaves: &[KVPair]) -> Result<Pruned> {
        if self.navigator.is_leaf(pos) && leaves.len() == 1 {
            return Ok(Visitable::leaf(pos.clone(), leaves[0].value.clone()));
        }
        if !self.navigator.is_root(pos) && leaves.is_empty() {
            let digest = self.cache.get(pos)?.ok_or_else(|| {
                BalloonError::InvalidProof(format!(
                    "audit path lacks hyper position {}",
                    hex::encode(&pos.index)
                ))
            })?;
            return Ok(Visitable::cached(pos.clone(), digest));
        }
        if self.navigator.is_leaf(pos) {
            return Err(broken_split(pos, leaves));
        }

        let (left_pos, right_pos) = children(&self.navigator, pos)?;
        let (left_leaves, right_leaves) = split_at_key(leaves, &right_pos.index);
        let left = self.traverse(&left_pos, left_leaves)?;
        let right = self.traverse(&right_pos, right_leaves)?;
        Ok(join(&self.navigator, pos.clone(), left, right))
    }
}
