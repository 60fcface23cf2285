//! Running counters for the miner.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct MinerStats {
    pub started: Instant,
    /// Rounds started, including exhausted and interrupted ones.
    pub rounds: u64,
    pub blocks_mined: u64,
    pub exhausted_rounds: u64,
    /// Solutions that failed verification and were discarded.
    pub invalid_reports: u64,
    pub respawns: u64,
    pub total_hashes: u64,
    pub last_round_hashes: u64,
    pub last_round_elapsed: Duration,
}

impl Default for MinerStats {
    fn default() -> Self {
        Self {
            started: Instant::now(),
            rounds: 0,
            blocks_mined: 0,
            exhausted_rounds: 0,
            invalid_reports: 0,
            respawns: 0,
            total_hashes: 0,
            last_round_hashes: 0,
            last_round_elapsed: Duration::ZERO,
        }
    }
}

impl MinerStats {
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Average hashes per second since start.
    pub fn hash_rate(&self) -> f64 {
        rate(self.total_hashes, self.uptime())
    }

    pub fn last_round_hash_rate(&self) -> f64 {
        rate(self.last_round_hashes, self.last_round_elapsed)
    }

    pub(crate) fn record_round(&mut self, hashes: u64, elapsed: Duration) {
        self.total_hashes += hashes;
        self.last_round_hashes = hashes;
        self.last_round_elapsed = elapsed;
    }
}

fn rate(hashes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        hashes as f64 / secs
    } else {
        0.0
    }
}
