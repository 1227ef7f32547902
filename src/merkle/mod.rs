//! # Merkle Hashing Engine
//!
//! Everything below the type-directed hasher: tree math and the zero-hash
//! table, the in-place layer-reduction root engine running over pooled
//! scratch buffers, chunk and leaf-list merkleization, inclusion proofs for
//! flat leaf schemas, and the incremental cached tree for workloads that
//! recompute roots over mostly-unchanged leaf sets.
//!
//! A *chunk* is 32 bytes. Merkleization pairs adjacent chunks with SHA-256,
//! padding odd layers with the zero-hash of that level, until one chunk
//! remains. List roots additionally mix the element count into the final
//! hash so length is bound into the root.

pub mod hasher;
pub mod math;
pub mod proof;
pub mod root;
pub mod tree;

pub use hasher::{sha256, sha256_pair, uint64_root};
pub use math::{get_depth, is_power_of_two, next_power_of_two, zero_hash, zero_hashes};
pub use proof::{merkle_proof, verify_proof};
pub use root::{
    bitlist_root_with_limit, bitvector_root_with_limit, bytes_root, compute_merkle_root,
    compute_merkle_root_from_level, compute_merkle_root_range, hash_tree_root_parts,
    merkleize_chunks, merkleize_vector, mix_in_length, HashableSsz, Leaf, Prehash,
};
pub use tree::{MerkleTree, DEFAULT_CACHE_DEPTH};
