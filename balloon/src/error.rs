//! Errors returned by balloon operations.

use thiserror::Error;

/// Alias for `core::result::Result<T, BalloonError>`.
pub type Result<T> = core::result::Result<T, BalloonError>;

/// Errors from balloon operations.
///
/// `Corruption` means the persisted tree can no longer be trusted and the
/// owning process should stop. `InvalidProof` is an expected outcome of
/// verifying untrusted input and never escapes a `verify` call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BalloonError {
    /// A digest the cache resolver guarantees to be persisted is missing.
    #[error("corruption: {0}")]
    Corruption(String),
    /// An audit path lacks a required entry or recomputes a different root.
    #[error("invalid proof: {0}")]
    InvalidProof(String),
    /// Malformed request parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Error propagated from the backing store.
    #[error("storage error: {0}")]
    StorageError(#[from] balloon_storage::Error),
    /// Proof (de)serialization failure.
    #[error("encoding error: {0}")]
    EncodingError(String),
    /// One of the concurrent tree updates panicked.
    #[error("task failed: {0}")]
    TaskFailed(String),
}
