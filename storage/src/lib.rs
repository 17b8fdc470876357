#![deny(missing_docs)]

//! Storage abstraction for the balloon authenticated log.
//!
//! The trees never write to storage themselves: every operation returns a
//! batch of [`Mutation`]s that the caller applies atomically with
//! [`Store::mutate`]. Reads go through [`Store::get`] and
//! [`Store::get_range`], the latter being the only range primitive the hyper
//! tree needs to recompute subtrees below its cache level.

pub mod error;
mod kv;
mod memory_storage;
#[cfg(feature = "rocksdb_storage")]
pub mod rocksdb_storage;
mod storage;

pub use crate::{
    error::Error,
    kv::{KVPair, KVRange, split_at_key},
    memory_storage::MemoryStore,
    storage::{Mutation, Prefix, Store, VERSION_KEY, decode_version},
};
