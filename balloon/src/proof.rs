//! Proofs exchanged with clients.
//!
//! A [`Commitment`] pins the state of the log after one addition. Clients
//! check [`MembershipProof`]s and [`IncrementalProof`]s against commitments
//! they obtained independently.

use bincode::{Decode, Encode};
use tracing::{debug, warn};

use crate::{
    cache::AuditPath,
    error::{BalloonError, Result},
    hashing::{Digest, Hasher},
    history, hyper,
};

pub(crate) fn encode_proof<T: Encode>(value: &T, what: &str) -> Result<Vec<u8>> {
    let config = bincode::config::standard()
        .with_big_endian()
        .with_no_limit();
    bincode::encode_to_vec(value, config)
        .map_err(|e| BalloonError::EncodingError(format!("failed to encode {what}: {e}")))
}

/// The decode limit is capped at 100 MiB so that a crafted length header
/// cannot trigger a huge allocation.
pub(crate) fn decode_proof<T: Decode<()>>(bytes: &[u8], what: &str) -> Result<T> {
    let config = bincode::config::standard()
        .with_big_endian()
        .with_limit::<{ 100 * 1024 * 1024 }>();
    let (value, _) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| BalloonError::EncodingError(format!("failed to decode {what}: {e}")))?;
    Ok(value)
}

/// Roots of both trees right after the event at `version` was added.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Commitment {
    /// History tree root
    pub history_digest: Digest,
    /// Hyper tree root
    pub hyper_digest: Digest,
    /// Version of the last added event
    pub version: u64,
}

impl Commitment {
    /// Serialize this commitment with bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        encode_proof(self, "Commitment")
    }

    /// Deserialize a commitment.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        decode_proof(bytes, "Commitment")
    }
}

/// Answer to "was this event added by `query_version`?".
///
/// The hyper proof tells whether and when the event was added; the history
/// proof ties it to the history tree at the queried version.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MembershipProof {
    /// Whether the event was added at or before `query_version`
    pub exists: bool,
    /// Hyper tree lookup of the event digest
    pub hyper_proof: Option<hyper::QueryProof>,
    /// History membership of the event at its actual version
    pub history_proof: Option<history::MembershipProof>,
    /// Last version issued when the proof was built
    pub current_version: u64,
    /// Version the question was asked about
    pub query_version: u64,
    /// Version at which the event was added, zero when it never was
    pub actual_version: u64,
    /// Digest of the event
    pub key_digest: Digest,
}

impl MembershipProof {
    /// Check the proof for `event` against `commitment`.
    ///
    /// The history proof is only consulted when the event exists and the
    /// query version does not exceed its actual version; otherwise the hyper
    /// proof alone decides.
    pub fn verify(&self, hasher: &dyn Hasher, event: &[u8], commitment: &Commitment) -> bool {
        debug!(
            query_version = self.query_version,
            actual_version = self.actual_version,
            exists = self.exists,
            "verifying membership proof"
        );
        let (Some(hyper_proof), Some(history_proof)) = (&self.hyper_proof, &self.history_proof)
        else {
            warn!("membership proof is missing a sub-proof");
            return false;
        };

        let digest = hasher.hash(&[event]);
        let hyper_correct = hyper_proof.verify(hasher, &digest, &commitment.hyper_digest);

        if self.exists && self.query_version <= self.actual_version {
            let history_correct =
                history_proof.verify(hasher, &digest, &commitment.history_digest);
            if !history_correct {
                warn!(
                    index = history_proof.index,
                    version = history_proof.version,
                    "history membership proof failed"
                );
            }
            return hyper_correct && history_correct;
        }
        hyper_correct
    }

    /// Serialize this proof with bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        encode_proof(self, "MembershipProof")
    }

    /// Deserialize a proof.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        decode_proof(bytes, "MembershipProof")
    }
}

/// Proof that the log at `start_version` is a prefix of the log at
/// `end_version`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct IncrementalProof {
    /// Older version
    pub start_version: u64,
    /// Newer version
    pub end_version: u64,
    /// History digests needed to rebuild both roots
    pub audit_path: AuditPath,
}

impl IncrementalProof {
    /// Create a proof.
    pub fn new(start_version: u64, end_version: u64, audit_path: AuditPath) -> Self {
        Self {
            start_version,
            end_version,
            audit_path,
        }
    }

    /// Check the proof against the commitments at both ends.
    pub fn verify(&self, hasher: &dyn Hasher, start: &Commitment, end: &Commitment) -> bool {
        if start.version != self.start_version || end.version != self.end_version {
            warn!(
                start = start.version,
                end = end.version,
                "commitments do not match the proven versions"
            );
            return false;
        }
        let proof = history::IncrementalProof::new(
            self.audit_path.clone(),
            self.start_version,
            self.end_version,
        );
        proof.verify(hasher, &start.history_digest, &end.history_digest)
    }

    /// Serialize this proof with bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        encode_proof(self, "IncrementalProof")
    }

    /// Deserialize a proof.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        decode_proof(bytes, "IncrementalProof")
    }
}
