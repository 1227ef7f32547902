//! Tree math and the zero-subtree hash table.

use std::sync::OnceLock;

use alloy_primitives::B256;

use crate::merkle::hasher::sha256_pair;

/// Depth of the deepest precomputed zero subtree.
pub const MAX_ZERO_HASH_DEPTH: usize = 64;

static ZERO_HASHES: OnceLock<[B256; MAX_ZERO_HASH_DEPTH + 1]> = OnceLock::new();

/// The full zero-hash table: `zero_hashes()[0]` is the zero chunk and
/// `zero_hashes()[i + 1] = sha256(zero_hashes()[i] || zero_hashes()[i])`.
pub fn zero_hashes() -> &'static [B256; MAX_ZERO_HASH_DEPTH + 1] {
    ZERO_HASHES.get_or_init(|| {
        let mut table = [B256::ZERO; MAX_ZERO_HASH_DEPTH + 1];
        for i in 0..MAX_ZERO_HASH_DEPTH {
            table[i + 1] = sha256_pair(table[i].as_slice(), table[i].as_slice());
        }
        table
    })
}

/// The root of an all-zero subtree of the given depth.
pub fn zero_hash(depth: usize) -> B256 {
    zero_hashes()[depth]
}

pub fn is_power_of_two(n: u64) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Rounds up to the next power of two, with `next_power_of_two(0) = 1`.
pub fn next_power_of_two(n: u64) -> u64 {
    if n <= 1 {
        return 1;
    }
    1u64 << (64 - (n - 1).leading_zeros())
}

/// Depth of a merkle tree over `n` leaves: 0 for `n <= 1`, `ceil(log2(n))`
/// otherwise.
pub fn get_depth(n: u64) -> usize {
    if n <= 1 {
        return 0;
    }
    (64 - (n - 1).leading_zeros()) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::hasher::sha256_pair;

    #[test]
    fn zero_hash_table_is_self_consistent() {
        let table = zero_hashes();
        assert_eq!(table[0], B256::ZERO);
        for i in 0..MAX_ZERO_HASH_DEPTH {
            assert_eq!(
                table[i + 1],
                sha256_pair(table[i].as_slice(), table[i].as_slice()),
                "level {i}"
            );
        }
    }

    #[test]
    fn zero_hash_depth_two_matches_known_value() {
        // sha256 applied twice over the zero chunk pair.
        let expected: B256 =
            "0xdb56114e00fdd4c1f85c892bf35ac9a89289aaecb1ebd0a96cde606a748b5d71"
                .parse()
                .unwrap();
        assert_eq!(zero_hash(2), expected);
    }

    #[test]
    fn next_power_of_two_rounds_up() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(4), 4);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(1023), 1024);
        assert_eq!(next_power_of_two(1 << 40), 1 << 40);
    }

    #[test]
    fn depth_is_ceil_log2() {
        assert_eq!(get_depth(0), 0);
        assert_eq!(get_depth(1), 0);
        assert_eq!(get_depth(2), 1);
        assert_eq!(get_depth(3), 2);
        assert_eq!(get_depth(4), 2);
        assert_eq!(get_depth(5), 3);
        assert_eq!(get_depth(16), 4);
        assert_eq!(get_depth(17), 5);
    }

    #[test]
    fn power_of_two_predicate() {
        assert!(!is_power_of_two(0));
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(2));
        assert!(!is_power_of_two(6));
        assert!(is_power_of_two(1 << 63));
    }
}
