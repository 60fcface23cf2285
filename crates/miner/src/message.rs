//! Messages exchanged between the coordinator and search units.

use crate::range::NonceRange;
use fractalchain_core::Block;

/// Coordinator to unit.
#[derive(Debug, Clone)]
pub enum UnitCommand {
    /// Scan `range` over a private copy of `template`.
    Search {
        round: u64,
        range: NonceRange,
        template: Block,
    },
    /// Stop scanning for `round`. Idle units acknowledge it too.
    Cancel { round: u64 },
    /// Exit the unit thread.
    Shutdown,
}

/// Unit to coordinator.
#[derive(Debug)]
pub enum UnitEvent {
    /// The unit found a nonce meeting the target and stopped.
    Solved {
        unit: usize,
        round: u64,
        block: Box<Block>,
        hashes: u64,
    },
    /// The unit scanned its whole range without success.
    Exhausted { unit: usize, round: u64, hashes: u64 },
    /// The unit observed a cancel (or shutdown) for `round`.
    Cancelled { unit: usize, round: u64, hashes: u64 },
    /// The unit thread panicked. Its range for the current round is lost.
    Crashed { unit: usize },
}

impl UnitEvent {
    /// Unit the event came from.
    pub fn unit(&self) -> usize {
        match self {
            UnitEvent::Solved { unit, .. }
            | UnitEvent::Exhausted { unit, .. }
            | UnitEvent::Cancelled { unit, .. }
            | UnitEvent::Crashed { unit } => *unit,
        }
    }

    /// Hashes computed since the unit's last report.
    pub fn hashes(&self) -> u64 {
        match self {
            UnitEvent::Solved { hashes, .. }
            | UnitEvent::Exhausted { hashes, .. }
            | UnitEvent::Cancelled { hashes, .. } => *hashes,
            UnitEvent::Crashed { .. } => 0,
        }
    }
}
