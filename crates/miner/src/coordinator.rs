//! The mining round state machine.
//!
//! One `Coordinator` owns the ledger, the mempool and the worker pool. Each
//! round moves through
//! `Building -> Dispatched -> (WinnerFound | Exhausted) -> Committed -> Cooldown`:
//!
//! ```text
//!   mempool + tip ──► template ──► partition ──► units 0..W
//!                                                  │
//!   ledger ◄── append ◄── verify ◄── first Solved ─┘
//!      │
//!      └──► remove included txs ──► cancel others ──► cooldown
//! ```
//!
//! Search units never touch the ledger. They receive a copy of the template
//! and report back over the pool's event channel.

use crate::config::{ConfigError, MinerConfig};
use crate::message::UnitEvent;
use crate::pool::{PoolError, WorkerPool};
use crate::range::partition;
use crate::search::{HeaderScan, NonceSearch};
use crate::stats::MinerStats;
use crossbeam_channel::{at, select, Receiver, RecvError, TryRecvError};
use fractalchain_chain::{
    ChainConfig, FeedReceiver, Ledger, LedgerError, Mempool, MempoolError, TemplateBuilder,
};
use fractalchain_consensus::BlockValidator;
use fractalchain_core::{Block, Hash, Transaction};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn};

#[derive(Error, Debug)]
pub enum MinerError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Search unit event channel closed")]
    EventsClosed,

    #[error("Invalid miner configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, MinerError>;

/// Where the coordinator is within the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Building,
    Dispatched,
    WinnerFound,
    Exhausted,
    Committed,
    Cooldown,
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundState::Building => "building",
            RoundState::Dispatched => "dispatched",
            RoundState::WinnerFound => "winner-found",
            RoundState::Exhausted => "exhausted",
            RoundState::Committed => "committed",
            RoundState::Cooldown => "cooldown",
        };
        f.write_str(name)
    }
}

/// Summary of a committed round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    pub round: u64,
    /// The block appended to the ledger.
    pub block: Block,
    /// Unit whose solution was accepted.
    pub winner: usize,
    /// Units sent a cancel after the winner was verified.
    pub cancelled: Vec<usize>,
    /// Cancelled units that confirmed they stopped before cooldown ended.
    pub acknowledged: Vec<usize>,
    /// Hashes reported by all units for this round.
    pub hashes: u64,
    /// Time from template to commit.
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub enum RoundOutcome {
    Committed(RoundReport),
    /// Every unit finished or crashed without a valid solution.
    Exhausted,
    /// A shutdown request arrived before a winner was found.
    Interrupted,
}

/// Point-in-time view of the miner.
#[derive(Debug, Clone)]
pub struct MinerStatus {
    pub height: u64,
    pub tip_hash: Hash,
    pub state: RoundState,
    pub round: u64,
    pub next_difficulty: u32,
    pub pending: usize,
    pub workers: usize,
    pub stats: MinerStats,
}

/// Single owner of the ledger, driving mining rounds over a [`WorkerPool`].
pub struct Coordinator {
    ledger: Ledger,
    mempool: Mempool,
    feed: Option<FeedReceiver>,
    builder: TemplateBuilder,
    pool: WorkerPool,
    config: MinerConfig,
    stats: MinerStats,
    state: RoundState,
    round: u64,
    stop_requested: bool,
}

impl Coordinator {
    /// Coordinator scanning with [`HeaderScan`].
    pub fn new(ledger: Ledger, chain: &ChainConfig, config: MinerConfig) -> Result<Self> {
        Self::with_search(ledger, chain, config, Arc::new(HeaderScan))
    }

    /// Coordinator whose units run `search`.
    pub fn with_search(
        ledger: Ledger,
        chain: &ChainConfig,
        config: MinerConfig,
        search: Arc<dyn NonceSearch>,
    ) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.workers, search)?;

        Ok(Self {
            ledger,
            mempool: Mempool::new(),
            feed: None,
            builder: TemplateBuilder::new(chain.node_id.clone(), chain.mining_reward),
            pool,
            config,
            stats: MinerStats::default(),
            state: RoundState::Building,
            round: 0,
            stop_requested: false,
        })
    }

    /// Drain `feed` into the mempool at the start of every round.
    pub fn with_feed(mut self, feed: FeedReceiver) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Queue a transaction for the next template.
    pub fn submit(&mut self, tx: Transaction) -> std::result::Result<(), MempoolError> {
        self.mempool.add(tx)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn stats(&self) -> &MinerStats {
        &self.stats
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn status(&self) -> MinerStatus {
        MinerStatus {
            height: self.ledger.height(),
            tip_hash: self.ledger.tip().hash,
            state: self.state,
            round: self.round,
            next_difficulty: self.ledger.next_difficulty(),
            pending: self.mempool.len() + self.feed.as_ref().map_or(0, FeedReceiver::len),
            workers: self.pool.size(),
            stats: self.stats.clone(),
        }
    }

    /// Run one round to completion.
    ///
    /// `shutdown` fires on a message or on disconnect. A shutdown seen before
    /// a winner yields [`RoundOutcome::Interrupted`]; one seen during cooldown
    /// ends the cooldown early and makes [`Coordinator::run`] stop afterwards.
    pub fn mine_round(&mut self, shutdown: &Receiver<()>) -> Result<RoundOutcome> {
        self.round += 1;
        self.stats.rounds += 1;
        let round = self.round;
        let span = info_span!("round", round);
        let _enter = span.enter();
        let started = Instant::now();

        self.set_state(RoundState::Building);
        if let Some(feed) = &self.feed {
            let ingested = self.mempool.ingest(feed);
            if ingested > 0 {
                debug!(ingested, "Transactions taken from feed");
            }
        }
        let pending = self.mempool.pending(self.config.max_block_transactions);
        let difficulty = self.ledger.next_difficulty();
        let template = self.builder.build(self.ledger.tip(), &pending, difficulty);

        let ranges = partition(self.pool.size(), self.config.chunk_size);
        let mut active: BTreeSet<usize> = self
            .pool
            .dispatch(round, &template, &ranges)
            .into_iter()
            .collect();
        self.set_state(RoundState::Dispatched);
        debug!(
            index = template.index,
            difficulty,
            transactions = template.tx_count(),
            units = active.len(),
            "Template dispatched"
        );

        // A cloned receiver so `self.pool` stays free for respawns
        let events = self.pool.events().clone();
        let mut hashes = 0u64;

        let (winner, block) = loop {
            if active.is_empty() {
                self.set_state(RoundState::Exhausted);
                self.stats.exhausted_rounds += 1;
                self.finish_round(hashes, started.elapsed());
                warn!(
                    index = template.index,
                    difficulty, hashes, "Every range exhausted without a solution"
                );
                return Ok(RoundOutcome::Exhausted);
            }

            let event = select! {
                recv(events) -> event => event.map_err(|_: RecvError| MinerError::EventsClosed)?,
                recv(shutdown) -> _ => {
                    self.stop_requested = true;
                    self.pool.cancel(round, None);
                    self.finish_round(hashes, started.elapsed());
                    info!("Round interrupted by shutdown");
                    return Ok(RoundOutcome::Interrupted);
                }
            };
            hashes += event.hashes();

            match event {
                UnitEvent::Solved {
                    unit,
                    round: reported,
                    block,
                    ..
                } if reported == round => {
                    active.remove(&unit);
                    match BlockValidator::validate_solution(&template, &block) {
                        Ok(()) => break (unit, *block),
                        Err(err) => {
                            self.stats.invalid_reports += 1;
                            warn!(unit, nonce = block.nonce, %err, "Discarding invalid solution");
                        }
                    }
                }
                UnitEvent::Exhausted {
                    unit,
                    round: reported,
                    ..
                }
                | UnitEvent::Cancelled {
                    unit,
                    round: reported,
                    ..
                } if reported == round => {
                    active.remove(&unit);
                    debug!(unit, remaining = active.len(), "Unit finished its range");
                }
                UnitEvent::Crashed { unit } => {
                    active.remove(&unit);
                    warn!(unit, "Search unit crashed, its range is abandoned for this round");
                    self.pool.respawn(unit)?;
                }
                stale => debug!(unit = stale.unit(), "Ignoring report from an earlier round"),
            }
        };

        self.set_state(RoundState::WinnerFound);
        info!(
            unit = winner,
            index = block.index,
            nonce = block.nonce,
            hash = %block.hash,
            "Solution verified"
        );
        let cancelled = self.pool.cancel(round, Some(winner));

        self.ledger.append(block.clone())?;
        let cleared = self.mempool.remove_included(&block.transactions);
        self.stats.blocks_mined += 1;
        self.set_state(RoundState::Committed);
        let elapsed = started.elapsed();
        info!(
            index = block.index,
            hash = %block.hash,
            difficulty = block.difficulty,
            transactions = block.tx_count(),
            cleared,
            elapsed_ms = elapsed.as_millis() as u64,
            "Block committed"
        );

        self.set_state(RoundState::Cooldown);
        let acknowledged = self.cooldown(round, &cancelled, &events, &mut hashes, shutdown)?;
        if acknowledged.len() < cancelled.len() {
            debug!(
                cancelled = cancelled.len(),
                acknowledged = acknowledged.len(),
                "Cooldown ended before every unit confirmed"
            );
        }
        self.finish_round(hashes, elapsed);

        Ok(RoundOutcome::Committed(RoundReport {
            round,
            block,
            winner,
            cancelled,
            acknowledged,
            hashes,
            elapsed,
        }))
    }

    /// Mine until `shutdown` fires, then persist and stop every unit.
    ///
    /// A fatal error (persistence failure, pool failure) is returned after a
    /// best-effort persist.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> Result<()> {
        info!(
            workers = self.pool.size(),
            chunk_size = self.config.chunk_size,
            height = self.ledger.height(),
            location = %self.ledger.location(),
            "Miner started"
        );

        while !self.stop_requested && !signalled(shutdown) {
            match self.mine_round(shutdown) {
                Ok(RoundOutcome::Committed(report)) => {
                    let status = self.status();
                    info!(
                        height = status.height,
                        next_difficulty = status.next_difficulty,
                        pending = status.pending,
                        blocks_mined = status.stats.blocks_mined,
                        hashes_per_sec = status.stats.last_round_hash_rate() as u64,
                        acknowledged = report.acknowledged.len(),
                        "Miner status"
                    );
                }
                Ok(RoundOutcome::Exhausted) => {}
                Ok(RoundOutcome::Interrupted) => break,
                Err(err) => {
                    error!(%err, "Mining stopped on a fatal error");
                    if let Err(persist_err) = self.ledger.persist() {
                        error!(%persist_err, "Best-effort persist failed");
                    }
                    self.pool.shutdown();
                    return Err(err);
                }
            }
        }

        self.shutdown()
    }

    /// Cancel all units, persist the ledger and join the unit threads.
    pub fn shutdown(&mut self) -> Result<()> {
        self.pool.cancel(self.round, None);
        let persisted = self.ledger.persist();
        self.pool.shutdown();
        persisted?;
        info!(
            height = self.ledger.height(),
            blocks_mined = self.stats.blocks_mined,
            total_hashes = self.stats.total_hashes,
            "Miner stopped"
        );
        Ok(())
    }

    /// Collect cancel acknowledgements until the cooldown deadline.
    fn cooldown(
        &mut self,
        round: u64,
        cancelled: &[usize],
        events: &Receiver<UnitEvent>,
        hashes: &mut u64,
        shutdown: &Receiver<()>,
    ) -> Result<Vec<usize>> {
        let deadline = at(Instant::now() + self.config.cooldown);
        let mut acknowledged = BTreeSet::new();

        loop {
            let event = select! {
                recv(events) -> event => event.map_err(|_: RecvError| MinerError::EventsClosed)?,
                recv(deadline) -> _ => break,
                recv(shutdown) -> _ => {
                    self.stop_requested = true;
                    break;
                }
            };
            *hashes += event.hashes();

            match event {
                UnitEvent::Cancelled {
                    unit,
                    round: reported,
                    ..
                } if reported == round && cancelled.contains(&unit) => {
                    acknowledged.insert(unit);
                }
                UnitEvent::Crashed { unit } => {
                    warn!(unit, "Search unit crashed during cooldown");
                    self.pool.respawn(unit)?;
                }
                late => debug!(unit = late.unit(), "Late report after commit ignored"),
            }
        }

        Ok(acknowledged.into_iter().collect())
    }

    fn finish_round(&mut self, hashes: u64, elapsed: Duration) {
        self.stats.record_round(hashes, elapsed);
        self.stats.respawns = self.pool.respawns();
    }

    fn set_state(&mut self, state: RoundState) {
        debug!(from = %self.state, to = %state, "Round state");
        self.state = state;
    }
}

/// Whether `shutdown` holds a message or has been disconnected.
fn signalled(shutdown: &Receiver<()>) -> bool {
    !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, never};
    use fractalchain_storage::JsonFileStore;
    use tempfile::TempDir;

    fn coordinator(dir: &TempDir, workers: usize) -> Coordinator {
        let chain = ChainConfig::default().with_node_id("test-node");
        let ledger = Ledger::open(Box::new(JsonFileStore::in_dir(dir.path())), 1).unwrap();
        let config = MinerConfig::default()
            .with_workers(workers)
            .with_chunk_size(100_000)
            .with_cooldown(Duration::from_millis(50));
        Coordinator::new(ledger, &chain, config).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let ledger = Ledger::open(Box::new(JsonFileStore::in_dir(dir.path())), 1).unwrap();
        let config = MinerConfig::default().with_workers(0);
        let result = Coordinator::new(ledger, &ChainConfig::default(), config);
        assert!(matches!(
            result,
            Err(MinerError::Config(ConfigError::ZeroWorkers))
        ));
    }

    #[test]
    fn test_round_commits_block_with_reward() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir, 2);

        let outcome = coordinator.mine_round(&never()).unwrap();
        let RoundOutcome::Committed(report) = outcome else {
            panic!("expected a committed round, got {outcome:?}");
        };

        assert_eq!(report.round, 1);
        assert_eq!(report.block.index, 1);
        assert!(report.block.meets_target());
        assert!(report.winner < 2);
        assert!(!report.cancelled.contains(&report.winner));
        assert!(report.hashes > 0);

        let reward = report.block.transactions.last().unwrap();
        assert!(reward.is_reward());
        assert_eq!(reward.to, "test-node");
        assert_eq!(reward.amount, 50);

        assert_eq!(coordinator.ledger().height(), 1);
        assert_eq!(coordinator.state(), RoundState::Cooldown);
        assert_eq!(coordinator.stats().blocks_mined, 1);
    }

    #[test]
    fn test_status_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir, 1);
        coordinator
            .submit(Transaction::new("alice", "bob", 10, "coffee"))
            .unwrap();

        let status = coordinator.status();
        assert_eq!(status.height, 0);
        assert_eq!(status.pending, 1);
        assert_eq!(status.workers, 1);
        assert_eq!(status.next_difficulty, 1);
        assert_eq!(status.tip_hash, coordinator.ledger().tip().hash);
    }

    #[test]
    fn test_closed_shutdown_channel_stops_run() {
        let dir = TempDir::new().unwrap();
        let mut coordinator = coordinator(&dir, 1);

        let (tx, rx) = bounded::<()>(1);
        drop(tx);

        coordinator.run(&rx).unwrap();
        assert_eq!(coordinator.stats().rounds, 0);
        assert_eq!(coordinator.ledger().height(), 0);
    }

    #[test]
    fn test_round_state_display() {
        assert_eq!(RoundState::WinnerFound.to_string(), "winner-found");
        assert_eq!(RoundState::Cooldown.to_string(), "cooldown");
    }
}
