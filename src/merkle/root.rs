//! # Merkle Root Engine
//!
//! The flat-buffer reduction at the bottom of every root computation.
//! `compute_merkle_root_range` copies the input into a pooled scratch
//! buffer sized with one spare chunk of headroom per level, then reduces it
//! level by level: odd layers are padded with the zero hash of that level,
//! pairs collapse in place into the low half, and the layer truncates to
//! the reduced size. The final 32 bytes are the root.
//!
//! `leaf_limit` fixes the tree depth independently of how many chunks are
//! physically present, which is how list types pad to their declared
//! maximum. `start_level` lets callers resume a reduction whose lower
//! levels were already hashed (the incremental tree finishes through here).

use alloy_primitives::B256;
use zerocopy::IntoBytes;

use crate::codec::bits;
use crate::error::{Result, SszError};
use crate::memory::default_pool;
use crate::merkle::hasher::{hash_pairs_in_place, sha256_pair, uint64_root};
use crate::merkle::math::{get_depth, next_power_of_two, zero_hash};
use crate::BYTES_PER_CHUNK;

/// Merkleizes `data` over its physical chunk count. Inputs of 32 bytes or
/// fewer are copied to `out` unchanged.
pub fn compute_merkle_root(data: &[u8], out: &mut [u8]) -> Result<()> {
    if data.len() <= BYTES_PER_CHUNK {
        out[..data.len()].copy_from_slice(data);
        return Ok(());
    }
    let chunks = data.len().div_ceil(BYTES_PER_CHUNK) as u64;
    compute_merkle_root_range(data, out, next_power_of_two(chunks), 0)
}

/// Merkleizes `data` that already lives at `start_level`, padding the tree
/// to the virtual byte length `data_byte_len` holds at level zero.
pub fn compute_merkle_root_from_level(
    data: &[u8],
    out: &mut [u8],
    data_byte_len: usize,
    start_level: usize,
) -> Result<()> {
    if data.len() <= BYTES_PER_CHUNK && start_level == 0 && data_byte_len <= BYTES_PER_CHUNK {
        out[..data.len()].copy_from_slice(data);
        return Ok(());
    }
    let chunks = data_byte_len.div_ceil(BYTES_PER_CHUNK) as u64;
    compute_merkle_root_range(data, out, next_power_of_two(chunks), start_level)
}

/// The core reduction: pads to `leaf_limit` leaves (the tree depth), with
/// `data` already hashed to `start_level`. `data` must be a multiple of 32
/// bytes; `out` receives the 32-byte root.
pub fn compute_merkle_root_range(
    data: &[u8],
    out: &mut [u8],
    leaf_limit: u64,
    start_level: usize,
) -> Result<()> {
    if data.len() % BYTES_PER_CHUNK != 0 {
        return Err(SszError::SizeMismatch {
            expected: data.len() + BYTES_PER_CHUNK - data.len() % BYTES_PER_CHUNK,
            got: data.len(),
        });
    }
    let depth = get_depth(leaf_limit);
    if data.is_empty() {
        out[..BYTES_PER_CHUNK].copy_from_slice(zero_hash(depth).as_slice());
        return Ok(());
    }

    // One pad chunk per level plus the final root fit in 64 bytes of
    // headroom: the layer halves before it can pad again.
    let mut scratch = default_pool().get(data.len() + 2 * BYTES_PER_CHUNK);
    scratch[..data.len()].copy_from_slice(data);
    let mut layer_len = data.len();

    for level in start_level..depth {
        let mut chunk_count = layer_len / BYTES_PER_CHUNK;
        if chunk_count % 2 != 0 {
            scratch[layer_len..layer_len + BYTES_PER_CHUNK]
                .copy_from_slice(zero_hash(level).as_slice());
            layer_len += BYTES_PER_CHUNK;
            chunk_count += 1;
        }
        let pairs = chunk_count / 2;
        hash_pairs_in_place(&mut scratch[..layer_len], pairs);
        layer_len = pairs * BYTES_PER_CHUNK;
    }

    out[..BYTES_PER_CHUNK].copy_from_slice(&scratch[..BYTES_PER_CHUNK]);
    Ok(())
}

/// Merkleizes a chunk list over its physical count.
pub fn merkleize_chunks(chunks: &[[u8; BYTES_PER_CHUNK]], out: &mut [u8; BYTES_PER_CHUNK]) -> Result<()> {
    compute_merkle_root(chunks.as_bytes(), out)
}

/// Merkleizes a chunk list padded to `leaf_count` leaves. An empty input
/// yields the zero hash at the padded depth.
pub fn merkleize_vector(chunks: &[[u8; BYTES_PER_CHUNK]], leaf_count: u64) -> Result<B256> {
    let depth = get_depth(leaf_count);
    if chunks.is_empty() {
        return Ok(zero_hash(depth));
    }
    let mut out = B256::ZERO;
    compute_merkle_root_range(
        chunks.as_bytes(),
        out.as_mut_slice(),
        next_power_of_two(leaf_count),
        0,
    )?;
    Ok(out)
}

/// Pads arbitrary bytes to a power-of-two chunk count and merkleizes.
pub fn bytes_root(data: &[u8]) -> Result<B256> {
    let mut out = B256::ZERO;
    if data.len() <= BYTES_PER_CHUNK {
        out[..data.len()].copy_from_slice(data);
        return Ok(out);
    }
    let leaf_count = next_power_of_two(data.len().div_ceil(BYTES_PER_CHUNK) as u64);
    let mut padded = data.to_vec();
    padded.resize(data.len().next_multiple_of(BYTES_PER_CHUNK), 0);
    compute_merkle_root_range(&padded, out.as_mut_slice(), leaf_count, 0)?;
    Ok(out)
}

/// Binds a list's length into its root: `sha256(root || uint64_root(n))`.
pub fn mix_in_length(root: B256, length: u64) -> B256 {
    sha256_pair(root.as_slice(), uint64_root(length).as_slice())
}

/// Packs packed-bit bytes into chunks, padding the last one.
pub(crate) fn pack_chunks(bytes: &[u8]) -> Vec<[u8; BYTES_PER_CHUNK]> {
    bytes
        .chunks(BYTES_PER_CHUNK)
        .map(|part| {
            let mut chunk = [0u8; BYTES_PER_CHUNK];
            chunk[..part.len()].copy_from_slice(part);
            chunk
        })
        .collect()
}

/// Root of a delimited bit-list against its declared bit limit: the
/// delimiter is stripped, the payload merkleizes to `ceil(limit/256)`
/// chunks, and the bit count is mixed in.
pub fn bitlist_root_with_limit(delimited: &[u8], limit_bits: u64) -> Result<B256> {
    let (payload, num_bits) = bits::decode_bitlist(delimited, limit_bits as usize)?;
    let chunks = pack_chunks(&payload);
    let base = merkleize_vector(&chunks, limit_bits.div_ceil(256))?;
    Ok(mix_in_length(base, num_bits as u64))
}

/// Root of a bit-vector against its declared bit limit.
pub fn bitvector_root_with_limit(bits: &[u8], limit_bits: u64) -> Result<B256> {
    let chunks = pack_chunks(bits);
    merkleize_vector(&chunks, limit_bits.div_ceil(256))
}

/// Pre-hashed roots for callers that compute field roots out of band.
pub trait HashableSsz {
    fn hash_ssz(&self) -> Result<B256>;
}

/// A root that is already final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prehash(pub B256);

impl HashableSsz for Prehash {
    fn hash_ssz(&self) -> Result<B256> {
        Ok(self.0)
    }
}

/// One leaf of a flat heterogeneous schema.
#[derive(Debug, Clone, Copy)]
pub enum Leaf<'a> {
    Bool(bool),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    /// Short slices pad into the leaf chunk; 32 bytes or longer hash to
    /// their bytes root first.
    Bytes(&'a [u8]),
    Root(B256),
}

/// Computes the tree root of a flat leaf schema: each part packs or hashes
/// into one chunk, and the chunk list merkleizes over its physical count.
pub fn hash_tree_root_parts(parts: &[Leaf<'_>]) -> Result<B256> {
    let leaf_count = next_power_of_two(parts.len() as u64) as usize;
    let mut leaves = vec![0u8; leaf_count * BYTES_PER_CHUNK];

    for (i, part) in parts.iter().enumerate() {
        let chunk = &mut leaves[i * BYTES_PER_CHUNK..(i + 1) * BYTES_PER_CHUNK];
        match part {
            Leaf::Bool(v) => chunk[0] = *v as u8,
            Leaf::Uint8(v) => chunk[0] = *v,
            Leaf::Uint16(v) => chunk[..2].copy_from_slice(&v.to_le_bytes()),
            Leaf::Uint32(v) => chunk[..4].copy_from_slice(&v.to_le_bytes()),
            Leaf::Uint64(v) => chunk[..8].copy_from_slice(&v.to_le_bytes()),
            Leaf::Bytes(bytes) => {
                if bytes.len() < BYTES_PER_CHUNK {
                    chunk[..bytes.len()].copy_from_slice(bytes);
                } else {
                    let root = bytes_root(bytes)?;
                    chunk.copy_from_slice(root.as_slice());
                }
            }
            Leaf::Root(root) => chunk.copy_from_slice(root.as_slice()),
        }
    }

    let mut out = B256::ZERO;
    compute_merkle_root(&leaves, out.as_mut_slice())?;
    Ok(out)
}
