//! Ledger transactions.
//!
//! Transactions are opaque value records: the mining engine commits to them
//! through the Merkle root but performs no signature or balance checks.

use crate::block::current_timestamp_ms;
use crate::hash::{hash, Hash};
use serde::{Deserialize, Serialize};

/// Sender used for reward and genesis transactions.
pub const NETWORK_ADDRESS: &str = "NETWORK";

/// A transaction on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender identity.
    pub from: String,
    /// Recipient identity.
    pub to: String,
    /// Value transferred.
    pub amount: u64,
    /// Free-form payload.
    pub data: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
}

impl Transaction {
    /// Create a transaction stamped with the current time.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        amount: u64,
        data: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
            data: data.into(),
            timestamp: current_timestamp_ms(),
        }
    }

    /// The reward transaction appended to every mined block.
    pub fn reward(node_id: impl Into<String>, amount: u64) -> Self {
        Self::new(NETWORK_ADDRESS, node_id, amount, "Reward")
    }

    /// The single transaction carried by the genesis block.
    pub fn genesis() -> Self {
        Self::new("GENESIS", NETWORK_ADDRESS, 0, "Genesis")
    }

    /// Leaf hash of this transaction in the Merkle commitment.
    pub fn hash(&self) -> Hash {
        let encoded = bincode::serialize(self).expect("serialization should not fail");
        hash(&encoded)
    }

    /// Whether this transaction was minted by the network rather than submitted.
    pub fn is_reward(&self) -> bool {
        self.from == NETWORK_ADDRESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let tx = Transaction::new("alice", "bob", 10, "");
        assert_eq!(tx.hash(), tx.hash());
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = Transaction {
            from: "alice".into(),
            to: "bob".into(),
            amount: 10,
            data: "memo".into(),
            timestamp: 1_000,
        };

        let mut other = base.clone();
        other.amount = 11;
        assert_ne!(base.hash(), other.hash());

        let mut other = base.clone();
        other.data = "memo2".into();
        assert_ne!(base.hash(), other.hash());

        let mut other = base.clone();
        other.timestamp = 1_001;
        assert_ne!(base.hash(), other.hash());
    }

    #[test]
    fn test_reward_transaction() {
        let tx = Transaction::reward("node-1", 50);
        assert!(tx.is_reward());
        assert_eq!(tx.to, "node-1");
        assert_eq!(tx.amount, 50);
    }

    #[test]
    fn test_json_field_names() {
        let tx = Transaction::new("a", "b", 1, "d");
        let value = serde_json::to_value(&tx).unwrap();
        for field in ["from", "to", "amount", "data", "timestamp"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }
}
