//! Channel from external submission paths into the coordinator's mempool.
//!
//! The feed itself never deduplicates. When the mempool ingests it, each
//! transaction is keyed by its leaf hash, so resubmitting a transaction with
//! identical fields (same millisecond timestamp included) yields one pending
//! entry and a logged duplicate. Callers that need two equal payments must
//! make them differ, for instance in `data` or `timestamp`.

use crossbeam_channel::{unbounded, Receiver, SendError, Sender};
use fractalchain_core::Transaction;

/// Cloneable producer handle for pending transactions.
#[derive(Debug, Clone)]
pub struct TransactionFeed {
    sender: Sender<Transaction>,
}

/// Consumer side, drained by the mempool at template-build time.
#[derive(Debug)]
pub struct FeedReceiver {
    receiver: Receiver<Transaction>,
}

/// Create a connected feed pair.
pub fn transaction_feed() -> (TransactionFeed, FeedReceiver) {
    let (sender, receiver) = unbounded();
    (TransactionFeed { sender }, FeedReceiver { receiver })
}

impl TransactionFeed {
    /// Enqueue a transaction. Fails only once the receiver is gone.
    ///
    /// Acceptance is decided later by the mempool; see the module docs.
    pub fn submit(&self, tx: Transaction) -> Result<(), SendError<Transaction>> {
        self.sender.send(tx)
    }
}

impl FeedReceiver {
    /// Take everything enqueued so far, in submission order, without blocking.
    pub fn drain(&self) -> Vec<Transaction> {
        self.receiver.try_iter().collect()
    }

    /// Number of transactions waiting in the channel.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether the channel is empty.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let (feed, rx) = transaction_feed();
        for i in 0..3 {
            feed.submit(Transaction::new("a", "b", i, "")).unwrap();
        }
        assert_eq!(rx.len(), 3);

        let drained = rx.drain();
        let amounts: Vec<u64> = drained.iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec![0, 1, 2]);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_submit_after_receiver_dropped() {
        let (feed, rx) = transaction_feed();
        drop(rx);
        assert!(feed.submit(Transaction::new("a", "b", 1, "")).is_err());
    }

    #[test]
    fn test_cloned_producers_share_queue() {
        let (feed, rx) = transaction_feed();
        let other = feed.clone();
        let handle = std::thread::spawn(move || {
            other.submit(Transaction::new("thread", "b", 1, "")).unwrap();
        });
        handle.join().unwrap();
        feed.submit(Transaction::new("main", "b", 2, "")).unwrap();
        assert_eq!(rx.drain().len(), 2);
    }
}
