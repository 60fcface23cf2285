//! Ledger location and display helpers shared by the commands.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use fractalchain_chain::Ledger;
use fractalchain_core::{Block, Hash};
use fractalchain_storage::{JsonFileStore, LedgerStore, SledStore};
use std::fs;
use std::path::PathBuf;

/// Directory name of the sled store inside the data directory.
pub const SLED_DIR_NAME: &str = "ledger.sled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Pretty JSON array rewritten atomically on every commit
    Json,
    /// Append-only sled log
    Sled,
}

#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    /// Directory to store blockchain data
    #[arg(short, long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Ledger storage backend
    #[arg(long, value_enum, default_value_t = StoreKind::Json)]
    pub store: StoreKind,
}

impl LedgerArgs {
    /// Open the configured store, creating the data directory if needed.
    pub fn open_store(&self) -> Result<Box<dyn LedgerStore>> {
        fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", self.data_dir.display())
        })?;

        let store: Box<dyn LedgerStore> = match self.store {
            StoreKind::Json => Box::new(JsonFileStore::in_dir(&self.data_dir)),
            StoreKind::Sled => {
                let path = self.data_dir.join(SLED_DIR_NAME);
                Box::new(
                    SledStore::open(&path)
                        .with_context(|| format!("Failed to open sled store: {}", path.display()))?,
                )
            }
        };
        Ok(store)
    }

    /// Open the ledger, creating genesis if nothing is persisted yet.
    pub fn open_ledger(&self, genesis_difficulty: u32) -> Result<Ledger> {
        let store = self.open_store()?;
        Ledger::open(store, genesis_difficulty).context("Failed to open ledger")
    }

    /// Load the persisted chain without creating anything.
    pub fn load_blocks(&self) -> Result<Vec<Block>> {
        let store = self.open_store()?;
        let location = store.location();
        store
            .load()
            .with_context(|| format!("Failed to read ledger at {location}"))?
            .with_context(|| {
                format!("No ledger at {location}. Did you run 'fractalchain init'?")
            })
    }
}

/// Render a millisecond Unix timestamp as UTC.
pub fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
        .unwrap_or_else(|| format!("{ms} ms"))
}

/// First 16 hex characters of a hash.
pub fn short_hash(hash: &Hash) -> String {
    hash.to_hex()[..16].to_string()
}
