//! Sorted key/value sequences returned by range reads.

use std::ops::Deref;

/// A key/value pair read from or destined to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KVPair {
    /// Key bytes
    pub key: Vec<u8>,
    /// Value bytes
    pub value: Vec<u8>,
}

impl KVPair {
    /// Create a new pair.
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }
}

/// Pairs sorted by key in ascending byte order, without duplicate keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KVRange(Vec<KVPair>);

impl KVRange {
    /// Empty range.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert `pair` keeping the range sorted. A pair with an equal key is
    /// replaced.
    pub fn insert_sorted(&mut self, pair: KVPair) {
        match self.0.binary_search_by(|p| p.key.as_slice().cmp(pair.key.as_slice())) {
            Ok(idx) => self.0[idx] = pair,
            Err(idx) => self.0.insert(idx, pair),
        }
    }

    /// Consume the range returning the underlying pairs.
    pub fn into_inner(self) -> Vec<KVPair> {
        self.0
    }
}

/// Split a sorted slice into the pairs with key `< key` and those with key
/// `>= key`.
pub fn split_at_key<'a>(pairs: &'a [KVPair], key: &[u8]) -> (&'a [KVPair], &'a [KVPair]) {
    let idx = pairs.partition_point(|p| p.key.as_slice() < key);
    pairs.split_at(idx)
}

impl Deref for KVRange {
    type Target = [KVPair];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<KVPair> for KVRange {
    /// Collects pairs, sorting them and keeping the last pair for a repeated
    /// key.
    fn from_iter<T: IntoIterator<Item = KVPair>>(iter: T) -> Self {
        let mut range = KVRange::new();
        for pair in iter {
            range.insert_sorted(pair);
        }
        range
    }
}

impl IntoIterator for KVRange {
    type Item = KVPair;
    type IntoIter = std::vec::IntoIter<KVPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
