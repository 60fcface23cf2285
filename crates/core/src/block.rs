//! Block and canonical block header.

use crate::hash::{hash, Hash};
use crate::merkle::transactions_root;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as u64
}

/// The hashed portion of a block.
///
/// Transactions are bound only through `merkle_root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub index: u64,
    pub previous_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u64,
    pub difficulty: u32,
    pub nonce: u64,
}

impl BlockHeader {
    /// Calculate the hash of this header.
    pub fn hash(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("serialization should not fail");
        hash(&encoded)
    }
}

/// A ledger block.
///
/// A freshly built template carries `nonce = 0` and `hash = Hash::ZERO`; the
/// winning search unit fills both via [`Block::seal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Position in the ledger (0 for genesis).
    pub index: u64,
    /// Hash of the block at `index - 1`.
    pub previous_hash: Hash,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// Transactions in commitment order.
    pub transactions: Vec<Transaction>,
    /// Merkle root over `transactions`.
    pub merkle_root: Hash,
    /// Required leading zero hex characters in `hash`.
    pub difficulty: u32,
    pub nonce: u64,
    pub hash: Hash,
}

impl Block {
    /// Create an unsealed block over the given transactions.
    pub fn new(
        index: u64,
        previous_hash: Hash,
        transactions: Vec<Transaction>,
        difficulty: u32,
    ) -> Self {
        let merkle_root = transactions_root(&transactions);
        Self {
            index,
            previous_hash,
            timestamp: current_timestamp_ms(),
            transactions,
            merkle_root,
            difficulty,
            nonce: 0,
            hash: Hash::ZERO,
        }
    }

    /// Create the genesis block. It is hashed but not mined.
    pub fn genesis(difficulty: u32) -> Self {
        let mut block = Self::new(0, Hash::ZERO, vec![Transaction::genesis()], difficulty);
        block.hash = block.compute_hash();
        block
    }

    /// The canonical header view of this block.
    pub fn header(&self) -> BlockHeader {
        BlockHeader {
            index: self.index,
            previous_hash: self.previous_hash,
            merkle_root: self.merkle_root,
            timestamp: self.timestamp,
            difficulty: self.difficulty,
            nonce: self.nonce,
        }
    }

    /// Recompute the header hash from the current fields.
    pub fn compute_hash(&self) -> Hash {
        self.header().hash()
    }

    /// Set the nonce and store the resulting header hash.
    pub fn seal(&mut self, nonce: u64) -> Hash {
        self.nonce = nonce;
        self.hash = self.compute_hash();
        self.hash
    }

    /// Whether the stored hash satisfies the block's difficulty.
    pub fn meets_target(&self) -> bool {
        self.hash.meets_difficulty(self.difficulty)
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == Hash::ZERO
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Verify the merkle root matches the transactions.
    pub fn verify_merkle_root(&self) -> bool {
        transactions_root(&self.transactions) == self.merkle_root
    }
}
