//! Policies deciding which history digests are served from a cache.
//!
//! A node at `(index, height)` covers leaves up to
//! `last = index + 2^height - 1`. Once every one of those leaves has been
//! added, the node's digest never changes again and it is persisted, so
//! each resolver is a pure function of the position and the versions the
//! operation is about.

use super::HistoryPosition;

/// Decides whether the digest of a position must come from a cache.
pub trait CacheResolver: Send + Sync {
    /// `true` when the digest at `pos` is taken from the cache instead of
    /// being recomputed.
    fn should_get_from_cache(&self, pos: &HistoryPosition) -> bool;
}

/// Resolver for operations targeting the last leaf of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleTargetedCacheResolver {
    version: u64,
}

impl SingleTargetedCacheResolver {
    /// Resolver for the tree at `version`.
    pub fn new(version: u64) -> Self {
        Self { version }
    }
}

impl CacheResolver for SingleTargetedCacheResolver {
    fn should_get_from_cache(&self, pos: &HistoryPosition) -> bool {
        self.version > pos.last_index()
    }
}

/// Resolver for proving the leaf at `start` against the tree at `end`.
///
/// Subtrees wholly left of `start`, or wholly right of it but within `end`,
/// are cached. Subtrees containing `start` are recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoubleTargetedCacheResolver {
    start: u64,
    end: u64,
}

impl DoubleTargetedCacheResolver {
    /// Resolver for leaf `start` in the tree at `end`.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

fn double_targeted(start: u64, end: u64, pos: &HistoryPosition) -> bool {
    let last = pos.last_index();
    if start > last && end > last {
        return true;
    }
    pos.index > start && last <= end
}

impl CacheResolver for DoubleTargetedCacheResolver {
    fn should_get_from_cache(&self, pos: &HistoryPosition) -> bool {
        if pos.height == 0 && pos.index == self.start {
            return false;
        }
        double_targeted(self.start, self.end, pos)
    }
}

/// Resolver for consistency proofs between the trees at `start` and `end`.
///
/// Same as [`DoubleTargetedCacheResolver`] except that the leaf at `start`
/// is itself taken from the cache, since the verifier only knows the two
/// roots and not the event behind that leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementalCacheResolver {
    start: u64,
    end: u64,
}

impl IncrementalCacheResolver {
    /// Resolver between versions `start` and `end`.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }
}

impl CacheResolver for IncrementalCacheResolver {
    fn should_get_from_cache(&self, pos: &HistoryPosition) -> bool {
        if pos.height == 0 && pos.index == self.start {
            return true;
        }
        double_targeted(self.start, self.end, pos)
    }
}
