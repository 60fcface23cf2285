//! Ledger ownership for fractalchain.
//!
//! This crate brings together the pieces the mining coordinator drives:
//! - **Ledger**: the validated, persisted, append-only block sequence
//! - **Mempool**: pending transactions, cleared only on commit
//! - **Feed**: channel through which external producers enqueue transactions
//! - **Template**: assembly of the candidate block for a round
//!
//! # Example
//!
//! ```rust,no_run
//! use fractalchain_chain::{ChainConfig, Ledger, Mempool, TemplateBuilder};
//! use fractalchain_storage::JsonFileStore;
//!
//! let config = ChainConfig::from_env().unwrap();
//! let ledger = Ledger::open(Box::new(JsonFileStore::in_dir("./data")), config.genesis_difficulty).unwrap();
//!
//! let mempool = Mempool::new();
//! let builder = TemplateBuilder::new(config.node_id.clone(), config.mining_reward);
//! let difficulty = ledger.next_difficulty();
//! let template = builder.build(ledger.tip(), &mempool.pending(1000), difficulty);
//! assert_eq!(template.index, ledger.height() + 1);
//! ```

pub mod config;
pub mod feed;
pub mod ledger;
pub mod mempool;
pub mod template;

// Re-export commonly used types
pub use config::{
    ChainConfig, ConfigError, DEFAULT_DIFFICULTY, DEFAULT_NODE_ID, DIFFICULTY_ENV, MINING_REWARD,
};
pub use feed::{transaction_feed, FeedReceiver, TransactionFeed};
pub use ledger::{Ledger, LedgerError};
pub use mempool::{Mempool, MempoolConfig, MempoolError, MempoolStats};
pub use template::TemplateBuilder;
