//! Sources of already-computed subtree digests.
//!
//! Pruners never decide on their own whether a digest is known; a cache
//! resolver decides, and a [`Cache`] answers. The server side reads from the
//! store ([`PassThroughCache`]) or from memory ([`SimpleCache`]); a verifier
//! reads from the [`AuditPath`] shipped with a proof.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use balloon_storage::{Prefix, Store};
use bincode::{Decode, Encode};
use tracing::debug;

use crate::{
    error::{BalloonError, Result},
    hashing::Digest,
    position::Position,
};

/// Read access to subtree digests.
pub trait Cache {
    /// Digest stored for `pos`, if any.
    fn get<P: Position>(&self, pos: &P) -> Result<Option<Digest>>;
}

/// A cache that can be updated in place.
pub trait ModifiableCache: Cache {
    /// Store `digest` under the [`Position::bytes`] of its position.
    fn put(&self, key: Vec<u8>, digest: Digest) -> Result<()>;

    /// Load every entry stored under `prefix`, keyed by position bytes.
    fn fill(&self, store: &dyn Store, prefix: Prefix) -> Result<()>;
}

/// Reads digests straight from the store.
#[derive(Debug)]
pub struct PassThroughCache<S> {
    prefix: Prefix,
    store: Arc<S>,
}

impl<S> PassThroughCache<S> {
    /// Read `prefix` keys from `store`.
    pub fn new(prefix: Prefix, store: Arc<S>) -> Self {
        Self { prefix, store }
    }
}

impl<S: Store> Cache for PassThroughCache<S> {
    fn get<P: Position>(&self, pos: &P) -> Result<Option<Digest>> {
        Ok(self.store.get(self.prefix, &pos.bytes())?)
    }
}

/// In-memory digest map keyed by position bytes.
#[derive(Debug, Default)]
pub struct SimpleCache {
    cached: RwLock<HashMap<Vec<u8>, Digest>>,
}

impl SimpleCache {
    /// Create an empty cache sized for `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            cached: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Number of cached digests.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Vec<u8>, Digest>>> {
        self.cached
            .read()
            .map_err(|e| BalloonError::TaskFailed(format!("cache lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Vec<u8>, Digest>>> {
        self.cached
            .write()
            .map_err(|e| BalloonError::TaskFailed(format!("cache lock poisoned: {e}")))
    }
}

impl Cache for SimpleCache {
    fn get<P: Position>(&self, pos: &P) -> Result<Option<Digest>> {
        Ok(self.read()?.get(&pos.bytes()).cloned())
    }
}

impl ModifiableCache for SimpleCache {
    fn put(&self, key: Vec<u8>, digest: Digest) -> Result<()> {
        self.write()?.insert(key, digest);
        Ok(())
    }

    fn fill(&self, store: &dyn Store, prefix: Prefix) -> Result<()> {
        let pairs = store.get_all(prefix)?;
        debug!(prefix = prefix.as_ref(), entries = pairs.len(), "warming cache");
        let mut cached = self.write()?;
        for pair in pairs {
            cached.insert(pair.key, pair.value);
        }
        Ok(())
    }
}

/// Digests a verifier needs to recompute a root, keyed by
/// [`Position::string_id`].
///
/// Nothing about an audit path is trusted: verifiers derive the positions
/// they need from the navigator and only look them up here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct AuditPath(BTreeMap<String, Digest>);

impl AuditPath {
    /// Empty audit path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `digest` under a position id.
    pub fn insert(&mut self, id: String, digest: Digest) {
        self.0.insert(id, digest);
    }

    /// Digest recorded under a position id.
    pub fn get_by_id(&self, id: &str) -> Option<&Digest> {
        self.0.get(id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Digest)> {
        self.0.iter()
    }
}

impl Cache for AuditPath {
    fn get<P: Position>(&self, pos: &P) -> Result<Option<Digest>> {
        Ok(self.0.get(&pos.string_id()).cloned())
    }
}

impl<K: Into<String>> FromIterator<(K, Digest)> for AuditPath {
    fn from_iter<T: IntoIterator<Item = (K, Digest)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use assert_matches::assert_matches;
    use balloon_storage::{MemoryStore, Mutation};

    use super::*;

    #[test]
    fn test_simple_cache_fill_and_put() {
        let store = MemoryStore::new();
        store
            .mutate(vec![
                Mutation::new(Prefix::HyperCache, vec![1, 0, 5], vec![7]),
                Mutation::new(Prefix::HistoryCache, vec![2, 0, 5], vec![8]),
            ])
            .expect("mutate");

        let cache = SimpleCache::new(4);
        cache.fill(&store, Prefix::HyperCache).expect("fill");
        assert_eq!(cache.len().expect("len"), 1);
        cache.put(vec![3, 0, 5], vec![9]).expect("put");
        assert_eq!(cache.len().expect("len"), 2);
    }

    #[test]
    fn test_poisoned_simple_cache_fails_instead_of_reporting_empty() {
        let cache = Arc::new(SimpleCache::new(4));
        cache.put(vec![1], vec![9]).expect("put");

        let holder = cache.clone();
        let poisoned = thread::spawn(move || {
            let _guard = holder.cached.write().expect("first lock");
            panic!("cache writer died");
        })
        .join();
        assert!(poisoned.is_err());

        assert_matches!(cache.len(), Err(BalloonError::TaskFailed(_)));
        assert_matches!(cache.put(vec![2], vec![0]), Err(BalloonError::TaskFailed(_)));
    }
}
