//! Parallel proof-of-work search for fractalchain.
//!
//! This crate provides:
//! - **Range**: partitioning of the nonce space into disjoint per-unit chunks
//! - **Search**: the per-unit scan with cooperative cancellation
//! - **Pool**: search units on OS threads, respawned after a crash
//! - **Coordinator**: the round state machine that owns the ledger
//!
//! # Example
//!
//! ```rust,no_run
//! use fractalchain_chain::{ChainConfig, Ledger};
//! use fractalchain_miner::{Coordinator, MinerConfig, RoundOutcome};
//! use fractalchain_storage::JsonFileStore;
//!
//! let chain = ChainConfig::from_env().unwrap();
//! let store = JsonFileStore::in_dir("./data");
//! let ledger = Ledger::open(Box::new(store), chain.genesis_difficulty).unwrap();
//!
//! let mut coordinator = Coordinator::new(ledger, &chain, MinerConfig::default()).unwrap();
//! if let RoundOutcome::Committed(report) = coordinator.mine_round(&crossbeam_channel::never()).unwrap() {
//!     println!("mined block {} by unit {}", report.block.index, report.winner);
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod message;
pub mod pool;
pub mod range;
pub mod search;
pub mod stats;

// Re-export commonly used types
pub use config::{ConfigError, MinerConfig, CHUNK_SIZE, COOLDOWN, MAX_BLOCK_TRANSACTIONS};
pub use coordinator::{
    Coordinator, MinerError, MinerStatus, RoundOutcome, RoundReport, RoundState,
};
pub use message::{UnitCommand, UnitEvent};
pub use pool::{PoolError, WorkerPool};
pub use range::{partition, NonceRange};
pub use search::{HeaderScan, NonceSearch, ScanContext, SearchOutcome};
pub use stats::MinerStats;
