//! Balloon configuration.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::hashing::{
    Blake3Hasher, FakeHasher, Hasher, PearsonHasher, Sha256Hasher, XorHasher,
};

/// Hash function selection.
///
/// The `fake_*` variants ignore position salts and only make sense for
/// checking small trees by hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HasherKind {
    /// Blake3, 256 bits
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
    /// 8-bit XOR
    Xor,
    /// 8-bit Pearson
    Pearson,
    /// XOR ignoring salts
    FakeXor,
    /// SHA-256 ignoring salts
    FakeSha256,
    /// Pearson ignoring salts
    FakePearson,
}

impl HasherKind {
    /// Instantiate the hasher.
    pub fn build(self) -> Arc<dyn Hasher> {
        match self {
            HasherKind::Blake3 => Arc::new(Blake3Hasher),
            HasherKind::Sha256 => Arc::new(Sha256Hasher),
            HasherKind::Xor => Arc::new(XorHasher),
            HasherKind::Pearson => Arc::new(PearsonHasher),
            HasherKind::FakeXor => Arc::new(FakeHasher(XorHasher)),
            HasherKind::FakeSha256 => Arc::new(FakeHasher(Sha256Hasher)),
            HasherKind::FakePearson => Arc::new(FakeHasher(PearsonHasher)),
        }
    }
}

/// Parameters of a [`Balloon`](crate::Balloon).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalloonConfig {
    /// Hash function of both trees
    pub hasher: HasherKind,
    /// Hyper tree cache level, defaults to
    /// [`default_cache_level`](crate::hyper::default_cache_level)
    pub cache_level: Option<u16>,
    /// First version to assign, overriding the one derived from the store
    pub initial_version: Option<u64>,
}

/// Location of an on-disk store.
#[cfg(feature = "rocksdb_storage")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// RocksDB directory
    pub path: std::path::PathBuf,
}

#[cfg(feature = "rocksdb_storage")]
impl StorageConfig {
    /// Open (or create) the RocksDB store at `path`.
    pub fn open(&self) -> crate::error::Result<balloon_storage::rocksdb_storage::RocksDbStore> {
        Ok(balloon_storage::rocksdb_storage::RocksDbStore::default_rocksdb_with_path(&self.path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config: BalloonConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config, BalloonConfig::default());
        assert_eq!(config.hasher.build().bits(), 256);
    }

    #[test]
    fn test_parse_config() {
        let config: BalloonConfig = serde_json::from_str(
            r#"{"hasher": "fake_xor", "cache_level": 4, "initial_version": 10}"#,
        )
        .expect("parse");
        assert_eq!(
            config,
            BalloonConfig {
                hasher: HasherKind::FakeXor,
                cache_level: Some(4),
                initial_version: Some(10),
            }
        );
        assert_eq!(config.hasher.build().bits(), 8);
    }

    #[test]
    fn test_unknown_hasher_is_rejected() {
        assert!(serde_json::from_str::<BalloonConfig>(r#"{"hasher": "md5"}"#).is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let config = BalloonConfig {
            hasher: HasherKind::Sha256,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).expect("serialize");
        assert_eq!(json, r#"{"hasher":"sha256","cache_level":null,"initial_version":null}"#);
    }
}
