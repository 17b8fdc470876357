//! Store contract consumed by the trees and caches.

use byteorder::{BigEndian, ByteOrder};
use strum::{AsRefStr, EnumIter};

use crate::{Error, KVRange};

/// Key under [`Prefix::Version`] holding the last committed version.
pub const VERSION_KEY: &[u8] = b"version";

/// Keyspace a key/value pair belongs to.
///
/// Each prefix is a single byte prepended to keys by backends that share one
/// physical keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, AsRefStr)]
#[repr(u8)]
pub enum Prefix {
    /// Hyper tree leaves: event digest to big-endian version.
    Index = 0x00,
    /// Hyper tree interior digests above the cache level.
    HyperCache = 0x01,
    /// History tree settled subtree digests.
    HistoryCache = 0x02,
    /// Balloon version counter.
    Version = 0x03,
}

impl Prefix {
    /// Byte written in front of every key of this prefix.
    pub fn byte(self) -> u8 {
        self as u8
    }
}

/// A single write to apply to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// Keyspace of the write
    pub prefix: Prefix,
    /// Key within the keyspace
    pub key: Vec<u8>,
    /// Value to store
    pub value: Vec<u8>,
}

impl Mutation {
    /// Create a new mutation.
    pub fn new(prefix: Prefix, key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { prefix, key, value }
    }

    /// Mutation persisting the balloon version counter.
    pub fn version(version: u64) -> Self {
        let mut value = vec![0u8; 8];
        BigEndian::write_u64(&mut value, version);
        Self::new(Prefix::Version, VERSION_KEY.to_vec(), value)
    }
}

/// Key/value store backing a balloon.
///
/// Implementations must be safe to share between the two concurrent tree
/// updates of a single add, hence the `Send + Sync` bound and the `&self`
/// receivers.
pub trait Store: Send + Sync {
    /// Get the value stored under `key`, if any.
    fn get(&self, prefix: Prefix, key: &[u8]) -> Result<Option<Vec<u8>>, Error>;

    /// Get every pair with `start <= key <= end`, sorted by key.
    fn get_range(&self, prefix: Prefix, start: &[u8], end: &[u8]) -> Result<KVRange, Error>;

    /// Get every pair under `prefix`, sorted by key.
    fn get_all(&self, prefix: Prefix) -> Result<KVRange, Error>;

    /// Apply a batch of mutations atomically.
    fn mutate(&self, mutations: Vec<Mutation>) -> Result<(), Error>;
}

/// Decode a version persisted with [`Mutation::version`].
pub fn decode_version(value: &[u8]) -> Result<u64, Error> {
    if value.len() != 8 {
        return Err(Error::CorruptedData(format!(
            "version must be 8 bytes, got {} ({})",
            value.len(),
            hex::encode(value)
        )));
    }
    Ok(BigEndian::read_u64(value))
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_prefix_bytes_are_distinct() {
        let bytes: Vec<u8> = Prefix::iter().map(Prefix::byte).collect();
        assert_eq!(bytes, vec![0x00, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_version_mutation_layout() {
        let mutation = Mutation::version(258);
        assert_eq!(mutation.prefix, Prefix::Version);
        assert_eq!(mutation.key, b"version".to_vec());
        assert_eq!(mutation.value, vec![0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(decode_version(&mutation.value).expect("8 bytes"), 258);
        assert!(decode_version(&[1, 2, 3]).is_err());
    }
}
