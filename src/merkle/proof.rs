//! Inclusion proofs for flat leaf schemas.
//!
//! A proof is the bottom-up list of sibling roots needed to recompute the
//! tree root from one leaf: entry 0 is adjacent to the leaf, the last entry
//! is the sibling of the top-level half. Generation recomputes each
//! sibling subtree with [`hash_tree_root_parts`]; verification folds the
//! branch back up and compares.

use alloy_primitives::B256;

use crate::error::{Result, SszError};
use crate::merkle::hasher::sha256_pair;
use crate::merkle::math::{get_depth, next_power_of_two};
use crate::merkle::root::{hash_tree_root_parts, Leaf};

/// Generates the sibling branch for `leaf_index` in a flat schema of
/// leaves. `depth` must equal the schema's tree depth.
pub fn merkle_proof(depth: usize, leaf_index: usize, leaves: &[Leaf<'_>]) -> Result<Vec<B256>> {
    let max_depth = get_depth(leaves.len() as u64);
    if depth != max_depth {
        return Err(SszError::InvalidSchema(format!(
            "proof depth mismatch: have {depth}, want {max_depth}"
        )));
    }
    if leaf_index >= leaves.len() {
        return Err(SszError::InvalidOffset {
            offset: leaf_index,
            bound: leaves.len(),
        });
    }

    let padded = next_power_of_two(leaves.len() as u64) as usize;
    let mut schema: Vec<Leaf<'_>> = leaves.to_vec();
    schema.resize(padded, Leaf::Root(B256::ZERO));

    let mut proof = vec![B256::ZERO; depth];
    let mut index = leaf_index;
    let mut window = schema.as_slice();

    for i in 0..depth {
        let half = window.len() / 2;
        if index >= half {
            proof[depth - i - 1] = hash_tree_root_parts(&window[..half])?;
            window = &window[half..];
            index -= half;
        } else {
            proof[depth - i - 1] = hash_tree_root_parts(&window[half..])?;
            window = &window[..half];
        }
    }

    Ok(proof)
}

/// Folds a branch back up from `leaf` at `leaf_index` and compares against
/// `root`.
pub fn verify_proof(root: &B256, branch: &[B256], leaf_index: usize, leaf: B256) -> bool {
    let mut current = leaf;
    let mut index = leaf_index;
    for sibling in branch {
        current = if index % 2 == 0 {
            sha256_pair(current.as_slice(), sibling.as_slice())
        } else {
            sha256_pair(sibling.as_slice(), current.as_slice())
        };
        index /= 2;
    }
    current == *root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_root(leaf: &Leaf<'_>) -> B256 {
        hash_tree_root_parts(std::slice::from_ref(leaf)).unwrap()
    }

    #[test]
    fn every_leaf_of_a_four_leaf_schema_verifies() {
        let parts = [
            Leaf::Uint64(1),
            Leaf::Uint64(2),
            Leaf::Uint64(3),
            Leaf::Uint64(4),
        ];
        let root = hash_tree_root_parts(&parts).unwrap();
        for i in 0..parts.len() {
            let proof = merkle_proof(2, i, &parts).unwrap();
            assert_eq!(proof.len(), 2);
            assert!(verify_proof(&root, &proof, i, leaf_root(&parts[i])), "leaf {i}");
        }
    }

    #[test]
    fn non_power_of_two_schemas_pad_with_zero_leaves() {
        let parts = [Leaf::Uint64(10), Leaf::Uint64(20), Leaf::Uint64(30)];
        let root = hash_tree_root_parts(&parts).unwrap();
        for i in 0..parts.len() {
            let proof = merkle_proof(2, i, &parts).unwrap();
            assert!(verify_proof(&root, &proof, i, leaf_root(&parts[i])));
        }
    }

    #[test]
    fn wrong_leaf_fails_verification() {
        let parts = [Leaf::Uint64(1), Leaf::Uint64(2)];
        let root = hash_tree_root_parts(&parts).unwrap();
        let proof = merkle_proof(1, 0, &parts).unwrap();
        assert!(!verify_proof(&root, &proof, 0, leaf_root(&Leaf::Uint64(9))));
        assert!(!verify_proof(&root, &proof, 1, leaf_root(&Leaf::Uint64(1))));
    }

    #[test]
    fn depth_mismatch_is_rejected() {
        let parts = [Leaf::Uint64(1), Leaf::Uint64(2), Leaf::Uint64(3)];
        let err = merkle_proof(3, 0, &parts).unwrap_err();
        assert!(err.to_string().contains("have 3, want 2"));
    }

    #[test]
    fn out_of_range_leaf_index_is_rejected() {
        let parts = [Leaf::Uint64(1), Leaf::Uint64(2)];
        assert!(merkle_proof(1, 2, &parts).is_err());
    }

    #[test]
    fn byte_leaves_prove_like_scalar_leaves() {
        let blob = vec![0x77u8; 96];
        let parts = [
            Leaf::Bytes(&[0xAA; 32]),
            Leaf::Bytes(&blob),
            Leaf::Bool(true),
            Leaf::Root(B256::repeat_byte(0x0C)),
        ];
        let root = hash_tree_root_parts(&parts).unwrap();
        for i in 0..parts.len() {
            let proof = merkle_proof(2, i, &parts).unwrap();
            assert!(verify_proof(&root, &proof, i, leaf_root(&parts[i])));
        }
    }
}
