//! Sparse Merkle trie keyed by event digest.
//!
//! The trie has one leaf per possible digest, so its depth equals the hasher
//! output length in bits. Leaves hold the big-endian version at which the
//! event was added. Almost every subtree is empty and is represented by a
//! precomputed default hash for its height.
//!
//! Interior digests above the cache level are persisted under
//! [`Prefix::HyperCache`](balloon_storage::Prefix::HyperCache) and mirrored in
//! memory. Below the cache level nothing but the leaves is stored: subtrees
//! are rebuilt from one range scan over
//! [`Prefix::Index`](balloon_storage::Prefix::Index).

mod cache_resolver;
mod navigator;
mod position;
mod proof;
mod pruner;
mod tree;


pub use cache_resolver::SingleTargetedCacheResolver;
pub use navigator::HyperNavigator;
pub use position::HyperPosition;
pub use proof::QueryProof;
pub use pruner::{InsertPruner, PruningContext, RebuildPruner, SearchPruner, VerifyPruner};
pub use tree::{HyperTree, default_cache_level};
