use std::{
    sync::{Arc, Mutex, MutexGuard},
    thread,
};

use balloon_storage::{Mutation, Prefix, Store, VERSION_KEY, decode_version};
use tracing::{debug, info};

use crate::{
    cache::{AuditPath, PassThroughCache},
    config::BalloonConfig,
    error::{BalloonError, Result},
    hashing::{Digest, Hasher},
    history::{self, HistoryTree},
    hyper::HyperTree,
    proof::{Commitment, IncrementalProof, MembershipProof},
};

/// Authenticated append-only log of events.
///
/// Every event is appended to the history tree at the next version and
/// indexed by digest in the hyper tree. Both trees read from the same store;
/// additions return the mutations to persist instead of writing them, unless
/// [`Balloon::add_and_commit`] is used.
pub struct Balloon<S> {
    /// Next version to assign
    version: Mutex<u64>,
    hasher: Arc<dyn Hasher>,
    store: Arc<S>,
    history: HistoryTree<PassThroughCache<S>>,
    hyper: HyperTree<S>,
}

impl<S: Store> Balloon<S> {
    /// Create a balloon over `store`, assigning versions from
    /// `config.initial_version` or zero.
    pub fn new(store: Arc<S>, config: &BalloonConfig) -> Result<Self> {
        let version = config.initial_version.unwrap_or(0);
        let hasher = config.hasher.build();
        let history = HistoryTree::new(
            hasher.clone(),
            PassThroughCache::new(Prefix::HistoryCache, store.clone()),
        );
        let hyper = HyperTree::new(hasher.clone(), store.clone(), config.cache_level)?;
        debug!(
            version,
            bits = hasher.bits(),
            cache_level = hyper.cache_level(),
            "balloon created"
        );

        Ok(Self {
            version: Mutex::new(version),
            hasher,
            store,
            history,
            hyper,
        })
    }

    /// Reopen a balloon persisted in `store`: resume after the last committed
    /// version and warm the hyper cache.
    pub fn load(store: Arc<S>, config: &BalloonConfig) -> Result<Self> {
        let persisted = store
            .get(Prefix::Version, VERSION_KEY)?
            .map(|value| decode_version(&value))
            .transpose()?;
        let version = match (config.initial_version, persisted) {
            (Some(initial), _) => initial,
            (None, Some(last)) => last.checked_add(1).ok_or_else(|| {
                BalloonError::Corruption("persisted version is already u64::MAX".to_string())
            })?,
            (None, None) => 0,
        };

        let balloon = Self::new(store, &BalloonConfig {
            initial_version: Some(version),
            ..config.clone()
        })?;
        balloon.hyper.warm_cache()?;
        info!(version, "balloon loaded");
        Ok(balloon)
    }

    /// Next version to assign.
    pub fn version(&self) -> Result<u64> {
        Ok(*self.lock_version()?)
    }

    /// Hash function of both trees.
    pub fn hasher(&self) -> &dyn Hasher {
        self.hasher.as_ref()
    }

    /// Recompute and persist the hyper tree digests above the cache level
    /// from the stored leaves. Returns the hyper root.
    ///
    /// Additions are blocked while the cache is rebuilt.
    pub fn rebuild_cache(&self) -> Result<Digest> {
        let _version = self.lock_version()?;
        self.hyper.rebuild_cache()
    }

    /// Append `event` at the next version.
    ///
    /// Returns the commitment to the new state and the batch the caller
    /// must apply atomically before the next addition. The version and the
    /// in-memory hyper cache only move when the addition succeeds.
    pub fn add(&self, event: &[u8]) -> Result<(Commitment, Vec<Mutation>)> {
        let mut version = self.lock_version()?;
        let (commitment, mutations) = self.add_at(event, *version)?;
        self.hyper.apply_cache(&mutations)?;
        *version += 1;
        Ok((commitment, mutations))
    }

    /// Append `event` and persist the resulting batch.
    pub fn add_and_commit(&self, event: &[u8]) -> Result<Commitment> {
        let mut version = self.lock_version()?;
        let (commitment, mutations) = self.add_at(event, *version)?;
        let hyper_cache: Vec<Mutation> = mutations
            .iter()
            .filter(|m| m.prefix == Prefix::HyperCache)
            .cloned()
            .collect();
        self.store.mutate(mutations)?;
        self.hyper.apply_cache(&hyper_cache)?;
        *version += 1;
        Ok(commitment)
    }

    fn add_at(&self, event: &[u8], version: u64) -> Result<(Commitment, Vec<Mutation>)> {
        if version == u64::MAX {
            return Err(BalloonError::InvalidInput("version space exhausted".to_string()));
        }
        let digest = self.hasher.hash(&[event]);
        debug!(version, digest = %hex::encode(&digest), "adding event");

        let (history, hyper) = thread::scope(|scope| {
            let history = scope.spawn(|| self.history.add(&digest, version));
            let hyper = self.hyper.add(&digest, version);
            let history = history.join().unwrap_or_else(|_| {
                Err(BalloonError::TaskFailed(
                    "history tree update panicked".to_string(),
                ))
            });
            (history, hyper)
        });
        let (history_digest, history_mutations) = history?;
        let (hyper_digest, hyper_mutations) = hyper?;

        let mut mutations =
            Vec::with_capacity(1 + history_mutations.len() + hyper_mutations.len());
        mutations.push(Mutation::version(version));
        mutations.extend(history_mutations);
        mutations.extend(hyper_mutations);

        Ok((
            Commitment {
                history_digest,
                hyper_digest,
                version,
            },
            mutations,
        ))
    }

    /// Prove whether `event` was added at or before `query_version`.
    pub fn query_membership(&self, event: &[u8], query_version: u64) -> Result<MembershipProof> {
        let current_version = self.last_version()?;
        if query_version > current_version {
            return Err(BalloonError::InvalidInput(format!(
                "query version {query_version} is beyond the last version {current_version}"
            )));
        }
        let key_digest = self.hasher.hash(&[event]);
        debug!(query_version, digest = %hex::encode(&key_digest), "querying membership");

        let hyper_proof = self.hyper.query_membership(&key_digest)?;
        let actual_version = match (&hyper_proof.value, hyper_proof.actual_version()) {
            (Some(value), None) => {
                return Err(BalloonError::Corruption(format!(
                    "hyper leaf {} holds {} instead of a version",
                    hex::encode(&key_digest),
                    hex::encode(value)
                )));
            }
            (_, actual) => actual,
        };
        let exists = actual_version.is_some_and(|actual| actual <= query_version);
        let actual_version = actual_version.unwrap_or(0);

        let history_proof = if exists {
            self.history.prove_membership(actual_version, query_version)?
        } else {
            history::MembershipProof::new(AuditPath::new(), actual_version, query_version)
        };

        Ok(MembershipProof {
            exists,
            hyper_proof: Some(hyper_proof),
            history_proof: Some(history_proof),
            current_version,
            query_version,
            actual_version,
            key_digest,
        })
    }

    /// Prove that the log at `start` is a prefix of the log at `end`.
    pub fn query_consistency(&self, start: u64, end: u64) -> Result<IncrementalProof> {
        let current_version = self.last_version()?;
        if end > current_version {
            return Err(BalloonError::InvalidInput(format!(
                "end version {end} is beyond the last version {current_version}"
            )));
        }
        let proof = self.history.prove_consistency(start, end)?;
        Ok(IncrementalProof::new(start, end, proof.audit_path))
    }

    /// Check `proof` for `event` against `commitment` with this balloon's
    /// hasher.
    pub fn verify_membership(
        &self,
        proof: &MembershipProof,
        event: &[u8],
        commitment: &Commitment,
    ) -> bool {
        proof.verify(self.hasher.as_ref(), event, commitment)
    }

    fn lock_version(&self) -> Result<MutexGuard<'_, u64>> {
        self.version
            .lock()
            .map_err(|e| BalloonError::TaskFailed(format!("version lock poisoned: {e}")))
    }

    fn last_version(&self) -> Result<u64> {
        self.version()?
            .checked_sub(1)
            .ok_or_else(|| BalloonError::InvalidInput("no event has been added yet".to_string()))
    }
}
