//! Hash functions used to combine tree nodes.
//!
//! Every tree instance is parameterized by one [`Hasher`]. Its output length
//! in bits fixes the depth of the hyper tree, so the toy 8-bit hashers yield a
//! 256-leaf trie that is small enough to reason about in tests.

use std::fmt;

use sha2::{Digest as _, Sha256};

/// Hash output. Equality is byte equality.
pub type Digest = Vec<u8>;

/// Fixed-contract hash function.
pub trait Hasher: Send + Sync + fmt::Debug {
    /// Hash the concatenation of `data`.
    fn hash(&self, data: &[&[u8]]) -> Digest;

    /// Hash `data` followed by `salt`.
    fn salted(&self, salt: &[u8], data: &[&[u8]]) -> Digest {
        let mut parts = Vec::with_capacity(data.len() + 1);
        parts.extend_from_slice(data);
        parts.push(salt);
        self.hash(&parts)
    }

    /// Output length in bits.
    fn bits(&self) -> u16;
}

/// 8-bit XOR of every input byte. Handy for hand-checking tree digests.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorHasher;

impl Hasher for XorHasher {
    fn hash(&self, data: &[&[u8]]) -> Digest {
        let result = data
            .iter()
            .flat_map(|elem| elem.iter())
            .fold(0u8, |acc, b| acc ^ b);
        vec![result]
    }

    fn bits(&self) -> u16 {
        8
    }
}

const PEARSON_TABLE: [u8; 256] = [
    0x62, 0x06, 0x55, 0x96, 0x24, 0x17, 0x70, 0xa4, 0x87, 0xcf, 0xa9, 0x05, 0x1a, 0x40, 0xa5, 0xdb,
    0x3d, 0x14, 0x44, 0x59, 0x82, 0x3f, 0x34, 0x66, 0x18, 0xe5, 0x84, 0xf5, 0x50, 0xd8, 0xc3, 0x73,
    0x5a, 0xa8, 0x9c, 0xcb, 0xb1, 0x78, 0x02, 0xbe, 0xbc, 0x07, 0x64, 0xb9, 0xae, 0xf3, 0xa2, 0x0a,
    0xed, 0x12, 0xfd, 0xe1, 0x08, 0xd0, 0xac, 0xf4, 0xff, 0x7e, 0x65, 0x4f, 0x91, 0xeb, 0xe4, 0x79,
    0x7b, 0xfb, 0x43, 0xfa, 0xa1, 0x00, 0x6b, 0x61, 0xf1, 0x6f, 0xb5, 0x52, 0xf9, 0x21, 0x45, 0x37,
    0x3b, 0x99, 0x1d, 0x09, 0xd5, 0xa7, 0x54, 0x5d, 0x1e, 0x2e, 0x5e, 0x4b, 0x97, 0x72, 0x49, 0xde,
    0xc5, 0x60, 0xd2, 0x2d, 0x10, 0xe3, 0xf8, 0xca, 0x33, 0x98, 0xfc, 0x7d, 0x51, 0xce, 0xd7, 0xba,
    0x27, 0x9e, 0xb2, 0xbb, 0x83, 0x88, 0x01, 0x31, 0x32, 0x11, 0x8d, 0x5b, 0x2f, 0x81, 0x3c, 0x63,
    0x9a, 0x23, 0x56, 0xab, 0x69, 0x22, 0x26, 0xc8, 0x93, 0x3a, 0x4d, 0x76, 0xad, 0xf6, 0x4c, 0xfe,
    0x85, 0xe8, 0xc4, 0x90, 0xc6, 0x7c, 0x35, 0x04, 0x6c, 0x4a, 0xdf, 0xea, 0x86, 0xe6, 0x9d, 0x8b,
    0xbd, 0xcd, 0xc7, 0x80, 0xb0, 0x13, 0xd3, 0xec, 0x7f, 0xc0, 0xe7, 0x46, 0xe9, 0x58, 0x92, 0x2c,
    0xb7, 0xc9, 0x16, 0x53, 0x0d, 0xd6, 0x74, 0x6d, 0x9f, 0x20, 0x5f, 0xe2, 0x8c, 0xdc, 0x39, 0x0c,
    0xdd, 0x1f, 0xd1, 0xb6, 0x8f, 0x5c, 0x95, 0xb8, 0x94, 0x3e, 0x71, 0x41, 0x25, 0x1b, 0x6a, 0xa6,
    0x03, 0x0e, 0xcc, 0x48, 0x15, 0x29, 0x38, 0x42, 0x1c, 0xc1, 0x28, 0xd9, 0x19, 0x36, 0xb3, 0x75,
    0xee, 0x57, 0xf0, 0x9b, 0xb4, 0xaa, 0xf2, 0xd4, 0xbf, 0xa3, 0x4e, 0xda, 0x89, 0xc2, 0xaf, 0x6e,
    0x2b, 0x77, 0xe0, 0x47, 0x7a, 0x8e, 0x2a, 0xa0, 0x68, 0x30, 0xf7, 0x67, 0x0f, 0x0b, 0x8a, 0xef,
];

/// 8-bit Pearson hash. Each input is hashed on its own, then the per-input
/// hashes are folded through the same table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PearsonHasher;

impl Hasher for PearsonHasher {
    fn hash(&self, data: &[&[u8]]) -> Digest {
        let pearson = |bytes: &mut dyn Iterator<Item = u8>| {
            bytes.fold(0u8, |h, v| PEARSON_TABLE[(h ^ v) as usize])
        };
        let mut partials = data.iter().map(|elem| pearson(&mut elem.iter().copied()));
        vec![pearson(&mut partials)]
    }

    fn bits(&self) -> u16 {
        8
    }
}

/// SHA-256.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash(&self, data: &[&[u8]]) -> Digest {
        let mut hasher = Sha256::new();
        for elem in data {
            hasher.update(elem);
        }
        hasher.finalize().to_vec()
    }

    fn bits(&self) -> u16 {
        256
    }
}

/// Blake3 with 256-bit output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl Hasher for Blake3Hasher {
    fn hash(&self, data: &[&[u8]]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        for elem in data {
            hasher.update(elem);
        }
        hasher.finalize().as_bytes().to_vec()
    }

    fn bits(&self) -> u16 {
        256
    }
}

/// Wraps a hasher so that [`Hasher::salted`] ignores the salt.
///
/// Position salting makes hyper tree digests depend on node addresses, which
/// gets in the way of checking small trees by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeHasher<H>(pub H);

impl<H: Hasher> Hasher for FakeHasher<H> {
    fn hash(&self, data: &[&[u8]]) -> Digest {
        self.0.hash(data)
    }

    fn salted(&self, _salt: &[u8], data: &[&[u8]]) -> Digest {
        self.0.hash(data)
    }

    fn bits(&self) -> u16 {
        self.0.bits()
    }
}
