// Solo Pool - Free and Open Source Software Statement
//
// This project, solo-pool, is Free and Open Source Software (FOSS) licensed
// under the MIT License. You are free to use, modify, and distribute this
// software in accordance with the license terms. Contributions are welcome
// via pull requests to the project repository.
//
// File: src/job/merkle.rs
// Version: 1.0.1
// Developer: OIEIEIO <oieieio@protonmail.com>
//
// This file computes merkle roots and the stratum merkle branch (the sibling
// path of the coinbase leaf), located in the job subdirectory. All hashes are
// in internal byte order.
//
// Tree Location:
// - src/job/merkle.rs (merkle tree helpers)
// - Depends on: crate::core::codec

use crate::core::codec::sha256d;

fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left);
    buf[32..].copy_from_slice(right);
    sha256d(&buf)
}

/// Merkle root over `leaves`; an odd leftover is paired with itself.
pub fn merkle_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            if let Some(last) = level.last().copied() {
                level.push(last);
            }
        }
        level = level.chunks(2).map(|pair| hash_pair(&pair[0], &pair[1])).collect();
    }
    level[0]
}

/// Sibling hashes on the path from the coinbase (leaf 0) to the root, given
/// the non-coinbase transaction hashes in block order.
pub fn merkle_branches(txids: &[[u8; 32]]) -> Vec<[u8; 32]> {
    let mut branches = Vec::new();
    // level without its leftmost element, which is always the coinbase path
    let mut rest = txids.to_vec();
    while !rest.is_empty() {
        branches.push(rest[0]);
        let mut tail = rest[1..].to_vec();
        if tail.len() % 2 == 1 {
            if let Some(last) = tail.last().copied() {
                tail.push(last);
            }
        }
        rest = tail.chunks(2).map(|pair| hash_pair(&pair[0], &pair[1])).collect();
    }
    branches
}

/// Folds the coinbase hash up through `branches` to the merkle root.
pub fn root_from_branches(coinbase_hash: [u8; 32], branches: &[[u8; 32]]) -> [u8; 32] {
    branches
        .iter()
        .fold(coinbase_hash, |acc, branch| hash_pair(&acc, branch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(n: u8) -> [u8; 32] {
        sha256d(&[n])
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let cb = leaf(0);
        assert_eq!(merkle_root(&[cb]), cb);
        assert!(merkle_branches(&[]).is_empty());
        assert_eq!(root_from_branches(cb, &[]), cb);
    }

    #[test]
    fn test_two_leaves() {
        let (a, b) = (leaf(0), leaf(1));
        assert_eq!(merkle_root(&[a, b]), hash_pair(&a, &b));
        assert_eq!(merkle_branches(&[b]), vec![b]);
    }

    #[test]
    fn test_odd_leaf_is_duplicated() {
        let (a, b, c) = (leaf(0), leaf(1), leaf(2));
        let expected = hash_pair(&hash_pair(&a, &b), &hash_pair(&c, &c));
        assert_eq!(merkle_root(&[a, b, c]), expected);
    }

    #[test]
    fn test_branches_reproduce_full_root() {
        for tx_count in 0..=12u8 {
            let coinbase = leaf(200);
            let txids: Vec<[u8; 32]> = (0..tx_count).map(leaf).collect();
            let mut all = vec![coinbase];
            all.extend_from_slice(&txids);
            let branches = merkle_branches(&txids);
            assert_eq!(
                root_from_branches(coinbase, &branches),
                merkle_root(&all),
                "tx_count={tx_count}"
            );
        }
    }

    #[test]
    fn test_branch_count_is_logarithmic() {
        let txids: Vec<[u8; 32]> = (0..100u8).map(leaf).collect();
        assert_eq!(merkle_branches(&txids).len(), 7);
    }
}

// Changelog:
// - v1.0.1 (2026-10-17): Branches are now the real coinbase sibling path.
// - v1.0.0 (2026-10-17): Initial merkle root computation.
