//! Storage errors

/// Storage and underlying errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Data read back from the store does not have the expected shape
    #[error("corrupted data: {0}")]
    CorruptedData(String),
    /// A lock guarding an in-memory store was poisoned by a panicking writer
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
    /// Rocks DB error
    #[cfg(feature = "rocksdb_storage")]
    #[error("rocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),
}
