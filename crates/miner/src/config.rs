//! Mining parameters.

use std::time::Duration;
use thiserror::Error;

/// Nonces assigned to each unit per round.
pub const CHUNK_SIZE: u64 = 1_000_000;

/// Pause between a committed block and the next round.
pub const COOLDOWN: Duration = Duration::from_secs(1);

/// Pending transactions taken into one template, reward excluded.
pub const MAX_BLOCK_TRANSACTIONS: usize = 1000;

/// Reasons a [`MinerConfig`] cannot drive a round.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("chunk size must be at least 1")]
    ZeroChunk,

    #[error("{workers} workers x {chunk_size} nonces overflows the nonce space")]
    NonceSpaceOverflow { workers: usize, chunk_size: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerConfig {
    /// Number of search units.
    pub workers: usize,
    pub chunk_size: u64,
    pub cooldown: Duration,
    pub max_block_transactions: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            chunk_size: CHUNK_SIZE,
            cooldown: COOLDOWN,
            max_block_transactions: MAX_BLOCK_TRANSACTIONS,
        }
    }
}

impl MinerConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Check the values can drive a round: at least one unit, non-empty
    /// chunks, and a nonce space `workers * chunk_size` that fits in a u64.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunk);
        }
        (self.workers as u64)
            .checked_mul(self.chunk_size)
            .ok_or(ConfigError::NonceSpaceOverflow {
                workers: self.workers,
                chunk_size: self.chunk_size,
            })?;
        Ok(())
    }
}
