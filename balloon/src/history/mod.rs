//! Append-only history tree.
//!
//! Leaves are event digests in insertion order; the leaf at index `i` is
//! added at version `i`. The tree at version `v` has `v + 1` leaves and its
//! root sits at the bit length of `v`, so the right-most subtrees form an
//! incomplete frontier made of [`PartialNode`](crate::Visitable::PartialNode)s.
//!
//! Settled subtree digests are persisted under
//! [`Prefix::HistoryCache`](balloon_storage::Prefix::HistoryCache) keyed by
//! [`HistoryPosition::bytes`](crate::Position::bytes), and the cache
//! resolvers decide from the version alone which of them can be reused.

mod cache_resolver;
mod navigator;
mod position;
mod proof;
mod pruner;
mod tree;

#[cfg(test)]
mod tests;

pub use cache_resolver::{
    CacheResolver, DoubleTargetedCacheResolver, IncrementalCacheResolver,
    SingleTargetedCacheResolver,
};
pub use navigator::HistoryNavigator;
pub use position::HistoryPosition;
pub use proof::{IncrementalProof, MembershipProof};
pub use pruner::{
    InsertPruner, PruningContext, SearchPruner, VerifyIncrementalPruner, VerifyPruner,
};
pub use tree::HistoryTree;
