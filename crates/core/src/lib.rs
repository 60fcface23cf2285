//! Core ledger primitives for fractalchain.
//!
//! This crate provides the fundamental types used throughout the ledger:
//! - Content hashing (Blake3) and the leading-zero difficulty predicate
//! - Transactions
//! - Blocks and the canonical block header
//! - Merkle commitments over ordered transaction lists

pub mod block;
pub mod hash;
pub mod merkle;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::{current_timestamp_ms, Block, BlockHeader};
pub use hash::{hash, hash_concat, Hash, H256};
pub use merkle::{merkle_root, transactions_root, MerkleTree, EMPTY_ROOT};
pub use transaction::{Transaction, NETWORK_ADDRESS};
