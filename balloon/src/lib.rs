#![warn(missing_docs)]

//! Authenticated append-only event log.
//!
//! A [`Balloon`] pairs two Merkle trees over the same events:
//!
//! - the [history tree](history), an append-only binary tree ordering event
//!   digests by version, which proves membership at a version and
//!   consistency between versions;
//! - the [hyper tree](hyper), a sparse Merkle trie keyed by event digest,
//!   which proves whether an event was ever added and at which version.
//!
//! Neither tree keeps nodes in memory between operations. Each operation
//! builds a minimal pruned tree of [`Visitable`] nodes out of the
//! [`Store`](balloon_storage::Store) and its caches, walks it once with a
//! visitor and drops it.

mod balloon;
pub mod cache;
pub mod config;
pub mod error;
pub mod hashing;
pub mod history;
pub mod hyper;
mod node;
mod position;
pub mod proof;
pub mod visitor;


pub use crate::{
    balloon::Balloon,
    config::{BalloonConfig, HasherKind},
    error::{BalloonError, Result},
    hashing::{Digest, Hasher},
    node::{PostOrderVisitor, PreOrderVisitor, Visitable},
    position::Position,
    proof::{Commitment, IncrementalProof, MembershipProof},
};
