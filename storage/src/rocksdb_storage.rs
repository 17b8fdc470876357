//! Store implemented over a RocksDB backend.
mod storage;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;

pub use self::storage::RocksDbStore;
