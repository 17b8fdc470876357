//! Builders of minimal history trees.
//!
//! Every pruner walks down from the navigator root. Whenever the resolver
//! says a position is cacheable the walk stops there with a
//! [`Visitable::Cached`] node, so the resulting tree has `O(log n)` nodes no
//! matter how many leaves the history holds.

use super::{CacheResolver, HistoryNavigator, HistoryPosition};
use crate::{
    cache::Cache,
    error::{BalloonError, Result},
    node::Visitable,
};

type Pruned = Visitable<HistoryPosition>;

/// Parameters shared by all history pruners.
pub struct PruningContext<'a, C> {
    /// Navigator rooted at the operation's version
    pub navigator: HistoryNavigator,
    /// Decides which positions come from `cache`
    pub cache_resolver: &'a dyn CacheResolver,
    /// Source of cached digests
    pub cache: &'a C,
}

impl<C: Cache> PruningContext<'_, C> {
    fn cached_or_corrupt(&self, pos: &HistoryPosition) -> Result<Pruned> {
        match self.cache.get(pos)? {
            Some(digest) => Ok(Visitable::cached(*pos, digest)),
            None => Err(BalloonError::Corruption(format!(
                "expected cached digest missing at history position {}",
                pos_label(pos)
            ))),
        }
    }

    fn cached_or_invalid(&self, pos: &HistoryPosition) -> Result<Pruned> {
        match self.cache.get(pos)? {
            Some(digest) => Ok(Visitable::cached(*pos, digest)),
            None => Err(BalloonError::InvalidProof(format!(
                "audit path lacks history position {}",
                pos_label(pos)
            ))),
        }
    }

    /// Assemble an interior node out of its already pruned children.
    fn join(
        &self,
        pos: HistoryPosition,
        mut build: impl FnMut(&HistoryPosition) -> Result<Pruned>,
    ) -> Result<Pruned> {
        let left_pos = self.navigator.go_to_left(&pos).ok_or_else(|| {
            BalloonError::InvalidInput(format!("leaf {} has no children", pos_label(&pos)))
        })?;
        let left = build(&left_pos)?;
        let Some(right_pos) = self.navigator.go_to_right(&pos) else {
            return Ok(Visitable::partial_node(pos, left));
        };
        let right = build(&right_pos)?;
        if self.navigator.is_root(&pos) {
            Ok(Visitable::root(pos, left, right))
        } else {
            Ok(Visitable::node(pos, left, right))
        }
    }
}

fn pos_label(pos: &HistoryPosition) -> String {
    format!("({}, {})", pos.index, pos.height)
}

/// Builds the tree needed to append the leaf at `version`.
///
/// The new leaf and every subtree settled by it are wrapped
/// [`Visitable::Collectable`] so their digests get persisted.
pub struct InsertPruner<'a, C> {
    version: u64,
    event_digest: &'a [u8],
    context: PruningContext<'a, C>,
}

impl<'a, C: Cache> InsertPruner<'a, C> {
    /// Pruner appending `event_digest` at `version`.
    pub fn new(version: u64, event_digest: &'a [u8], context: PruningContext<'a, C>) -> Self {
        Self {
            version,
            event_digest,
            context,
        }
    }

    /// Build the pruned tree.
    pub fn prune(&self) -> Result<Pruned> {
        self.traverse(&self.context.navigator.root())
    }

    fn traverse(&self, pos: &HistoryPosition) -> Result<Pruned> {
        if self.context.cache_resolver.should_get_from_cache(pos) {
            return self.context.cached_or_corrupt(pos);
        }
        if self.context.navigator.is_leaf(pos) {
            return Ok(Visitable::collectable(Visitable::leaf(
                *pos,
                self.event_digest.to_vec(),
            )));
        }
        let pruned = self.context.join(*pos, |child| self.traverse(child))?;
        if matches!(pruned, Visitable::PartialNode { .. }) || !self.should_collect(pos) {
            return Ok(pruned);
        }
        Ok(Visitable::collectable(pruned))
    }

    fn should_collect(&self, pos: &HistoryPosition) -> bool {
        self.version >= pos.last_index()
    }
}

/// Builds the tree from which a proof's audit path is collected.
///
/// Every cached position is wrapped collectable; the target leaf itself is
/// left out since the verifier supplies it.
pub struct SearchPruner<'a, C> {
    context: PruningContext<'a, C>,
}

impl<'a, C: Cache> SearchPruner<'a, C> {
    /// Pruner over `context`.
    pub fn new(context: PruningContext<'a, C>) -> Self {
        Self { context }
    }

    /// Build the pruned tree.
    pub fn prune(&self) -> Result<Pruned> {
        self.traverse(&self.context.navigator.root())
    }

    fn traverse(&self, pos: &HistoryPosition) -> Result<Pruned> {
        if self.context.cache_resolver.should_get_from_cache(pos) {
            return Ok(Visitable::collectable(self.context.cached_or_corrupt(pos)?));
        }
        if self.context.navigator.is_leaf(pos) {
            return Ok(Visitable::leaf(*pos, Vec::new()));
        }
        self.context.join(*pos, |child| self.traverse(child))
    }
}

/// Rebuilds, on the verifier side, the tree a membership proof describes.
pub struct VerifyPruner<'a, C> {
    event_digest: &'a [u8],
    context: PruningContext<'a, C>,
}

impl<'a, C: Cache> VerifyPruner<'a, C> {
    /// Pruner placing `event_digest` at the target leaf.
    pub fn new(event_digest: &'a [u8], context: PruningContext<'a, C>) -> Self {
        Self {
            event_digest,
            context,
        }
    }

    /// Build the pruned tree. Fails with [`BalloonError::InvalidProof`] when
    /// the audit path lacks a required digest.
    pub fn prune(&self) -> Result<Pruned> {
        self.traverse(&self.context.navigator.root())
    }

    fn traverse(&self, pos: &HistoryPosition) -> Result<Pruned> {
        if self.context.cache_resolver.should_get_from_cache(pos) {
            return self.context.cached_or_invalid(pos);
        }
        if self.context.navigator.is_leaf(pos) {
            return Ok(Visitable::leaf(*pos, self.event_digest.to_vec()));
        }
        self.context.join(*pos, |child| self.traverse(child))
    }
}

/// Rebuilds one of the two trees an incremental proof describes. Every leaf
/// must come from the audit path.
pub struct VerifyIncrementalPruner<'a, C> {
    context: PruningContext<'a, C>,
}

impl<'a, C: Cache> VerifyIncrementalPruner<'a, C> {
    /// Pruner over `context`.
    pub fn new(context: PruningContext<'a, C>) -> Self {
        Self { context }
    }

    /// Build the pruned tree.
    pub fn prune(&self) -> Result<Pruned> {
        self.traverse(&self.context.navigator.root())
    }

    fn traverse(&self, pos: &HistoryPosition) -> Result<Pruned> {
        if self.context.cache_resolver.should_get_from_cache(pos) {
            return self.context.cached_or_invalid(pos);
        }
        if self.context.navigator.is_leaf(pos) {
            return Err(BalloonError::InvalidProof(format!(
                "leaf {} is not covered by the audit path",
                pos_label(pos)
            )));
        }
        self.context.join(*pos, |child| self.traverse(child))
    }
}
