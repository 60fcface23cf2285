//! Merkle commitment over an ordered transaction list.

use crate::hash::{hash_concat, Hash};
use crate::transaction::Transaction;

/// Root committed to by a block with no transactions.
pub const EMPTY_ROOT: Hash = Hash::ZERO;

fn reduce_level(level: &[Hash]) -> Vec<Hash> {
    let mut next = Vec::with_capacity(level.len().div_ceil(2));
    for pair in level.chunks(2) {
        // Odd number of elements: the last node is paired with itself
        let right = pair.get(1).unwrap_or(&pair[0]);
        next.push(hash_concat(&[pair[0].as_ref(), right.as_ref()]));
    }
    next
}

/// Compute the merkle root of a list of leaf hashes.
///
/// Returns [`EMPTY_ROOT`] if the list is empty and the leaf itself for a
/// single element. Order matters: no sorting is applied.
pub fn merkle_root(hashes: &[Hash]) -> Hash {
    match hashes {
        [] => EMPTY_ROOT,
        [single] => *single,
        _ => {
            let mut current = reduce_level(hashes);
            while current.len() > 1 {
                current = reduce_level(&current);
            }
            current[0]
        }
    }
}

/// Merkle root over transactions in their stored order.
pub fn transactions_root(transactions: &[Transaction]) -> Hash {
    let leaves: Vec<Hash> = transactions.iter().map(Transaction::hash).collect();
    merkle_root(&leaves)
}

/// A merkle tree that keeps every level, leaves first.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash>>,
    leaf_count: usize,
}

impl MerkleTree {
    /// Build a merkle tree from a list of leaf hashes.
    pub fn new(leaves: &[Hash]) -> Self {
        if leaves.is_empty() {
            return Self {
                levels: vec![vec![EMPTY_ROOT]],
                leaf_count: 0,
            };
        }

        let mut levels = vec![leaves.to_vec()];
        loop {
            let current = &levels[levels.len() - 1];
            if current.len() <= 1 {
                break;
            }
            let next = reduce_level(current);
            levels.push(next);
        }

        Self {
            levels,
            leaf_count: leaves.len(),
        }
    }

    /// Build a tree over transaction leaves.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let leaves: Vec<Hash> = transactions.iter().map(Transaction::hash).collect();
        Self::new(&leaves)
    }

    /// Get the root of the merkle tree.
    pub fn root(&self) -> Hash {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(EMPTY_ROOT)
    }

    /// Number of committed leaves. Zero for the empty tree.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of levels including the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Nodes at the given level (0 = leaves).
    pub fn level(&self, depth: usize) -> Option<&[Hash]> {
        self.levels.get(depth).map(Vec::as_slice)
    }
}
