//! Fixed-size pool of search units.
//!
//! Each unit is an OS thread with its own command channel. All units report
//! on one shared event channel owned by the pool.

use crate::message::{UnitCommand, UnitEvent};
use crate::range::NonceRange;
use crate::search::{NonceSearch, ScanContext, ScanExit, SearchOutcome};
use crossbeam_channel::{unbounded, Receiver, Sender};
use fractalchain_core::Block;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error, warn};

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Failed to spawn search unit {unit}: {source}")]
    Spawn {
        unit: usize,
        #[source]
        source: io::Error,
    },

    #[error("Unknown search unit: {0}")]
    UnknownUnit(usize),
}

pub type Result<T> = std::result::Result<T, PoolError>;

struct UnitHandle {
    commands: Sender<UnitCommand>,
    thread: Option<JoinHandle<()>>,
}

/// Search units plus the shared event channel.
pub struct WorkerPool {
    units: Vec<UnitHandle>,
    events_tx: Sender<UnitEvent>,
    events_rx: Receiver<UnitEvent>,
    search: Arc<dyn NonceSearch>,
    respawns: u64,
}

impl WorkerPool {
    /// Spawn `size` units running `search`.
    pub fn new(size: usize, search: Arc<dyn NonceSearch>) -> Result<Self> {
        let (events_tx, events_rx) = unbounded();
        let mut pool = Self {
            units: Vec::with_capacity(size),
            events_tx,
            events_rx,
            search,
            respawns: 0,
        };
        for unit in 0..size {
            let handle = pool.spawn_unit(unit)?;
            pool.units.push(handle);
        }
        debug!(units = size, "Search pool started");
        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.units.len()
    }

    /// Shared channel every unit reports on.
    pub fn events(&self) -> &Receiver<UnitEvent> {
        &self.events_rx
    }

    /// Number of units replaced after a crash.
    pub fn respawns(&self) -> u64 {
        self.respawns
    }

    /// Send unit `i` the range `ranges[i]` over its own copy of `template`.
    ///
    /// Returns the units that accepted the command. A unit whose thread has
    /// died is skipped; its crash event is already queued.
    pub fn dispatch(&self, round: u64, template: &Block, ranges: &[NonceRange]) -> Vec<usize> {
        self.units
            .iter()
            .zip(ranges)
            .enumerate()
            .filter_map(|(unit, (handle, range))| {
                let command = UnitCommand::Search {
                    round,
                    range: *range,
                    template: template.clone(),
                };
                match handle.commands.send(command) {
                    Ok(()) => Some(unit),
                    Err(_) => {
                        warn!(unit, round, "Search unit unreachable, range not dispatched");
                        None
                    }
                }
            })
            .collect()
    }

    /// Cancel `round` on every unit except `except`. Returns the units signalled.
    pub fn cancel(&self, round: u64, except: Option<usize>) -> Vec<usize> {
        self.units
            .iter()
            .enumerate()
            .filter(|(unit, _)| Some(*unit) != except)
            .filter_map(|(unit, handle)| {
                handle
                    .commands
                    .send(UnitCommand::Cancel { round })
                    .ok()
                    .map(|_| unit)
            })
            .collect()
    }

    /// Replace a crashed unit with a fresh thread.
    pub fn respawn(&mut self, unit: usize) -> Result<()> {
        if unit >= self.units.len() {
            return Err(PoolError::UnknownUnit(unit));
        }
        let fresh = self.spawn_unit(unit)?;
        let old = std::mem::replace(&mut self.units[unit], fresh);
        let _ = old.commands.send(UnitCommand::Shutdown);
        if let Some(thread) = old.thread {
            // The old thread has already unwound; its panic was reported
            let _ = thread.join();
        }
        self.respawns += 1;
        warn!(unit, respawns = self.respawns, "Search unit respawned");
        Ok(())
    }

    /// Stop every unit and wait for the threads to exit.
    pub fn shutdown(&mut self) {
        for handle in &self.units {
            let _ = handle.commands.send(UnitCommand::Shutdown);
        }
        for (unit, handle) in self.units.iter_mut().enumerate() {
            if let Some(thread) = handle.thread.take() {
                if thread.join().is_err() {
                    error!(unit, "Search unit panicked during shutdown");
                }
            }
        }
    }

    fn spawn_unit(&self, unit: usize) -> Result<UnitHandle> {
        let (commands_tx, commands_rx) = unbounded();
        let events = self.events_tx.clone();
        let search = Arc::clone(&self.search);
        let thread = thread::Builder::new()
            .name(format!("search-unit-{unit}"))
            .spawn(move || run_unit(unit, commands_rx, events, search))
            .map_err(|source| PoolError::Spawn { unit, source })?;
        Ok(UnitHandle {
            commands: commands_tx,
            thread: Some(thread),
        })
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Reports a panic on the event channel while the unit thread unwinds.
struct CrashGuard {
    unit: usize,
    events: Sender<UnitEvent>,
}

impl Drop for CrashGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            let _ = self.events.send(UnitEvent::Crashed { unit: self.unit });
        }
    }
}

fn run_unit(
    unit: usize,
    commands: Receiver<UnitCommand>,
    events: Sender<UnitEvent>,
    search: Arc<dyn NonceSearch>,
) {
    let _guard = CrashGuard {
        unit,
        events: events.clone(),
    };
    let mut next = None;

    loop {
        let command = match next.take() {
            Some(command) => command,
            None => match commands.recv() {
                Ok(command) => command,
                Err(_) => return,
            },
        };

        match command {
            UnitCommand::Shutdown => return,
            UnitCommand::Cancel { round } => {
                // Idle: nothing to stop, but the coordinator waits for the ack
                if events
                    .send(UnitEvent::Cancelled {
                        unit,
                        round,
                        hashes: 0,
                    })
                    .is_err()
                {
                    return;
                }
            }
            UnitCommand::Search {
                round,
                range,
                template,
            } => {
                let mut ctx = ScanContext::new(unit, round, &commands);
                let outcome = search.search(&template, range, &mut ctx);
                let hashes = ctx.hashes();
                let event = match outcome {
                    SearchOutcome::Found(block) => UnitEvent::Solved {
                        unit,
                        round,
                        block: Box::new(block),
                        hashes,
                    },
                    SearchOutcome::Exhausted => UnitEvent::Exhausted {
                        unit,
                        round,
                        hashes,
                    },
                    SearchOutcome::Cancelled => UnitEvent::Cancelled {
                        unit,
                        round,
                        hashes,
                    },
                };
                if events.send(event).is_err() {
                    return;
                }
                match ctx.finish() {
                    ScanExit::Idle => {}
                    ScanExit::Deferred(command) => next = Some(command),
                    ScanExit::Shutdown => return,
                }
            }
        }
    }
}
