//! Implementation of the store contract over RocksDB.
use std::path::Path;

use lazy_static::lazy_static;
use rocksdb::{DB, Direction, IteratorMode, WriteBatch};
use tracing::{debug, trace};

use crate::{Error, KVPair, KVRange, Mutation, Prefix, Store};

lazy_static! {
    static ref DEFAULT_OPTS: rocksdb::Options = {
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(true);
        opts.increase_parallelism(num_cpus::get() as i32);
        opts.set_allow_mmap_writes(true);
        opts.set_allow_mmap_reads(true);
        opts.set_atomic_flush(true);
        opts
    };
}

/// Store which uses RocksDB as its backend.
///
/// Every key is written as `prefix byte || key` into the default column
/// family, so a range over one prefix is a contiguous scan.
pub struct RocksDbStore {
    db: DB,
}

fn make_prefixed_key(prefix: Prefix, key: &[u8]) -> Vec<u8> {
    let mut prefixed_key = Vec::with_capacity(key.len() + 1);
    prefixed_key.push(prefix.byte());
    prefixed_key.extend_from_slice(key);
    prefixed_key
}

impl RocksDbStore {
    /// Open (or create) a store at `path` with the default options.
    pub fn default_rocksdb_with_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        debug!(path = %path.as_ref().display(), "opening rocksdb store");
        let db = DB::open(&DEFAULT_OPTS, path)?;
        Ok(RocksDbStore { db })
    }

    fn scan_forward(
        &self,
        prefix: Prefix,
        start: &[u8],
        mut keep: impl FnMut(&[u8]) -> bool,
    ) -> Result<KVRange, Error> {
        let from = make_prefixed_key(prefix, start);
        let mut pairs = Vec::new();
        for item in self.db.iterator(IteratorMode::From(&from, Direction::Forward)) {
            let (key, value) = item?;
            if key.first() != Some(&prefix.byte()) || !keep(&key[1..]) {
                break;
            }
            pairs.push(KVPair::new(key[1..].to_vec(), value.to_vec()));
        }
        trace!(prefix = prefix.as_ref(), pairs = pairs.len(), "range read");
        Ok(pairs.into_iter().collect())
    }
}

impl Store for RocksDbStore {
    fn get(&self, prefix: Prefix, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.db.get(make_prefixed_key(prefix, key))?)
    }

    fn get_range(&self, prefix: Prefix, start: &[u8], end: &[u8]) -> Result<KVRange, Error> {
        if start > end {
            return Ok(KVRange::new());
        }
        self.scan_forward(prefix, start, |key| key <= end)
    }

    fn get_all(&self, prefix: Prefix) -> Result<KVRange, Error> {
        self.scan_forward(prefix, &[], |_| true)
    }

    fn mutate(&self, mutations: Vec<Mutation>) -> Result<(), Error> {
        let mut batch = WriteBatch::default();
        for mutation in &mutations {
            batch.put(make_prefixed_key(mutation.prefix, &mutation.key), &mutation.value);
        }
        debug!(mutations = mutations.len(), "applying batch");
        self.db.write(batch)?;
        Ok(())
    }
}
