//! Candidate block assembly.

use fractalchain_core::{Block, Transaction};

/// Builds the unsealed block each mining round searches over.
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    node_id: String,
    reward: u64,
}

impl TemplateBuilder {
    pub fn new(node_id: impl Into<String>, reward: u64) -> Self {
        Self {
            node_id: node_id.into(),
            reward,
        }
    }

    /// Identity credited by the reward transaction.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Assemble `pending ++ [reward]` on top of `tip`.
    ///
    /// The result has `nonce = 0` and an unset (zero) hash. `pending` is
    /// copied, the caller's queue is left untouched.
    pub fn build(&self, tip: &Block, pending: &[Transaction], difficulty: u32) -> Block {
        let mut transactions = Vec::with_capacity(pending.len() + 1);
        transactions.extend_from_slice(pending);
        transactions.push(Transaction::reward(self.node_id.as_str(), self.reward));

        Block::new(tip.index + 1, tip.hash, transactions, difficulty)
    }
}
