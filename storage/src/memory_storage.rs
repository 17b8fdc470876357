//! In-memory store.

use std::{
    collections::BTreeMap,
    ops::Bound,
    sync::{RwLock, RwLockReadGuard},
};

use tracing::trace;

use crate::{Error, KVPair, KVRange, Mutation, Prefix, Store};

/// Ordered in-memory store. Keys are kept in one map behind a single prefix
/// byte, the same layout the RocksDB backend uses on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

fn prefixed_key(prefix: Prefix, key: &[u8]) -> Vec<u8> {
    let mut prefixed = Vec::with_capacity(key.len() + 1);
    prefixed.push(prefix.byte());
    prefixed.extend_from_slice(key);
    prefixed
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>, Error> {
        self.data
            .read()
            .map_err(|e| Error::LockPoisoned(e.to_string()))
    }

    fn collect_range(
        &self,
        prefix: Prefix,
        lower: Bound<Vec<u8>>,
        upper: Bound<Vec<u8>>,
    ) -> Result<KVRange, Error> {
        let data = self.read()?;
        let range: KVRange = data
            .range((lower, upper))
            .map(|(k, v)| KVPair::new(k[1..].to_vec(), v.clone()))
            .collect();
        trace!(prefix = prefix.as_ref(), pairs = range.len(), "range read");
        Ok(range)
    }
}

impl Store for MemoryStore {
    fn get(&self, prefix: Prefix, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.read()?.get(&prefixed_key(prefix, key)).cloned())
    }

    fn get_range(&self, prefix: Prefix, start: &[u8], end: &[u8]) -> Result<KVRange, Error> {
        if start > end {
            return Ok(KVRange::new());
        }
        self.collect_range(
            prefix,
            Bound::Included(prefixed_key(prefix, start)),
            Bound::Included(prefixed_key(prefix, end)),
        )
    }

    fn get_all(&self, prefix: Prefix) -> Result<KVRange, Error> {
        let upper = match prefix.byte().checked_add(1) {
            Some(next) => Bound::Excluded(vec![next]),
            None => Bound::Unbounded,
        };
        self.collect_range(prefix, Bound::Included(vec![prefix.byte()]), upper)
    }

    fn mutate(&self, mutations: Vec<Mutation>) -> Result<(), Error> {
        let mut data = self
            .data
            .write()
            .map_err(|e| Error::LockPoisoned(e.to_string()))?;
        for mutation in mutations {
            data.insert(prefixed_key(mutation.prefix, &mutation.key), mutation.value);
        }
        Ok(())
    }
}
