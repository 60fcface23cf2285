//! Pending-transaction queue.
//!
//! The mempool holds submitted transactions, in arrival order, until a block
//! containing them is committed. Building a template only reads from it.

use crate::feed::FeedReceiver;
use fractalchain_core::{Hash, Transaction};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Errors that can occur during mempool operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MempoolError {
    #[error("transaction already in mempool")]
    DuplicateTransaction,

    #[error("mempool is full (capacity: {0})")]
    MempoolFull(usize),
}

pub type Result<T> = std::result::Result<T, MempoolError>;

/// Configuration for the mempool.
#[derive(Debug, Clone)]
pub struct MempoolConfig {
    /// Maximum number of transactions in the mempool.
    pub max_transactions: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_transactions: 10_000,
        }
    }
}

/// Transaction mempool.
pub struct Mempool {
    /// Configuration.
    config: MempoolConfig,
    /// Transactions indexed by hash.
    transactions: HashMap<Hash, Transaction>,
    /// Arrival order.
    order: VecDeque<Hash>,
}

impl Mempool {
    /// Create a new mempool with default configuration.
    pub fn new() -> Self {
        Self::with_config(MempoolConfig::default())
    }

    /// Create a new mempool with the given configuration.
    pub fn with_config(config: MempoolConfig) -> Self {
        Self {
            config,
            transactions: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Get the number of transactions in the mempool.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the mempool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Check if a transaction is in the mempool.
    pub fn contains(&self, tx_hash: &Hash) -> bool {
        self.transactions.contains_key(tx_hash)
    }

    /// Add a transaction to the back of the queue.
    ///
    /// Transactions are keyed by their leaf hash, so a second submission with
    /// identical fields (timestamp included) is rejected as a duplicate.
    pub fn add(&mut self, tx: Transaction) -> Result<()> {
        let tx_hash = tx.hash();

        if self.contains(&tx_hash) {
            return Err(MempoolError::DuplicateTransaction);
        }

        if self.transactions.len() >= self.config.max_transactions {
            return Err(MempoolError::MempoolFull(self.config.max_transactions));
        }

        self.order.push_back(tx_hash);
        self.transactions.insert(tx_hash, tx);
        Ok(())
    }

    /// Move everything waiting on the feed into the mempool.
    ///
    /// Rejected transactions are logged and dropped. Returns how many were accepted.
    pub fn ingest(&mut self, feed: &FeedReceiver) -> usize {
        let mut accepted = 0;
        for tx in feed.drain() {
            match self.add(tx) {
                Ok(()) => accepted += 1,
                Err(e) => tracing::warn!(error = %e, "dropping submitted transaction"),
            }
        }
        accepted
    }

    /// Remove exactly the transactions committed in a block.
    ///
    /// Transactions submitted after the block's template was built stay queued.
    /// Returns how many were removed.
    pub fn remove_included(&mut self, included: &[Transaction]) -> usize {
        let mut removed = 0;
        for tx in included {
            let tx_hash = tx.hash();
            if self.transactions.remove(&tx_hash).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            let transactions = &self.transactions;
            self.order.retain(|h| transactions.contains_key(h));
        }
        removed
    }

    /// Oldest `limit` transactions, in arrival order.
    pub fn pending(&self, limit: usize) -> Vec<Transaction> {
        self.order
            .iter()
            .take(limit)
            .filter_map(|h| self.transactions.get(h).cloned())
            .collect()
    }

    /// Get mempool statistics.
    pub fn stats(&self) -> MempoolStats {
        MempoolStats {
            total_transactions: self.len(),
            total_amount: self
                .transactions
                .values()
                .fold(0u64, |total, tx| total.saturating_add(tx.amount)),
            capacity: self.config.max_transactions,
        }
    }
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

/// Mempool statistics.
#[derive(Debug, Clone)]
pub struct MempoolStats {
    /// Total number of transactions.
    pub total_transactions: usize,
    /// Sum of pending amounts, saturating at `u64::MAX`.
    pub total_amount: u64,
    /// Mempool capacity.
    pub capacity: usize,
}
