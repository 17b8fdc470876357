//! Useful utilities for testing.

use std::ops::Deref;

use tempfile::TempDir;

use super::*;

/// RocksDb store with self-cleanup
pub struct TempStore {
    _dir: TempDir,
    store: RocksDbStore,
}

impl TempStore {
    /// Create new `TempStore`
    pub fn new() -> Self {
        let dir = TempDir::new().expect("cannot create tempdir");
        let store =
            RocksDbStore::default_rocksdb_with_path(dir.path()).expect("cannot open RocksDB store");
        TempStore { _dir: dir, store }
    }
}

impl Deref for TempStore {
    type Target = RocksDbStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}
