//! SHA-256 wrappers used by the merkle layers.

use alloy_primitives::B256;
use sha2::{Digest, Sha256};

/// Hashes a single byte string.
pub fn sha256(data: &[u8]) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    B256::from(<[u8; 32]>::from(hasher.finalize()))
}

/// Hashes the concatenation of two byte strings in one pass.
pub fn sha256_pair(a: &[u8], b: &[u8]) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(a);
    hasher.update(b);
    B256::from(<[u8; 32]>::from(hasher.finalize()))
}

/// A 32-byte chunk carrying `value` little-endian in its low 8 bytes.
pub fn uint64_root(value: u64) -> B256 {
    let mut root = B256::ZERO;
    root[..8].copy_from_slice(&value.to_le_bytes());
    root
}

/// Reduces adjacent 64-byte pairs into their 32-byte hashes in place:
/// chunk `i` of the output overwrites bytes `32i..32i+32`, reading pair
/// `i` from `64i..64i+64`. The caller passes the pair count.
pub(crate) fn hash_pairs_in_place(layer: &mut [u8], pairs: usize) {
    let mut buf = [0u8; 64];
    for i in 0..pairs {
        buf.copy_from_slice(&layer[i * 64..i * 64 + 64]);
        let digest = sha256(&buf);
        layer[i * 32..i * 32 + 32].copy_from_slice(digest.as_slice());
    }
}
