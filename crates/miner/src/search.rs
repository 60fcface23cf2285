//! The per-unit nonce scan.

use crate::message::UnitCommand;
use crate::range::NonceRange;
use crossbeam_channel::{Receiver, TryRecvError};
use fractalchain_core::Block;

/// Result of scanning one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A sealed block whose hash meets its difficulty.
    Found(Block),
    /// Every nonce in the range was tried.
    Exhausted,
    /// The scan stopped early because [`ScanContext::should_stop`] said so.
    Cancelled,
}

/// A search strategy run by every unit of a pool.
///
/// Implementations must call [`ScanContext::should_stop`] at least once per
/// nonce (or per small batch) so a cancel takes effect promptly.
pub trait NonceSearch: Send + Sync {
    fn search(&self, template: &Block, range: NonceRange, ctx: &mut ScanContext<'_>) -> SearchOutcome;
}

/// Ascending scan of the header hash, one cancellation check per nonce.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderScan;

impl NonceSearch for HeaderScan {
    fn search(&self, template: &Block, range: NonceRange, ctx: &mut ScanContext<'_>) -> SearchOutcome {
        let mut block = template.clone();
        for nonce in range.iter() {
            if ctx.should_stop() {
                return SearchOutcome::Cancelled;
            }
            let hash = block.seal(nonce);
            ctx.record_hash();
            if hash.meets_difficulty(block.difficulty) {
                return SearchOutcome::Found(block);
            }
        }
        SearchOutcome::Exhausted
    }
}

/// What the unit should do once a scan has returned.
#[derive(Debug)]
pub(crate) enum ScanExit {
    /// Wait for the next command.
    Idle,
    /// A new command arrived mid-scan; run it next.
    Deferred(UnitCommand),
    /// Exit the unit thread.
    Shutdown,
}

/// Per-scan view of the unit's command channel plus a hash counter.
pub struct ScanContext<'a> {
    unit: usize,
    round: u64,
    commands: &'a Receiver<UnitCommand>,
    hashes: u64,
    stopped: bool,
    exit: Option<ScanExit>,
}

impl<'a> ScanContext<'a> {
    pub(crate) fn new(unit: usize, round: u64, commands: &'a Receiver<UnitCommand>) -> Self {
        Self {
            unit,
            round,
            commands,
            hashes: 0,
            stopped: false,
            exit: None,
        }
    }

    /// Unit running this scan.
    pub fn unit(&self) -> usize {
        self.unit
    }

    /// Round this scan belongs to.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Count one hash attempt.
    pub fn record_hash(&mut self) {
        self.hashes += 1;
    }

    /// Hash attempts recorded so far.
    pub fn hashes(&self) -> u64 {
        self.hashes
    }

    /// Poll the command channel. Returns true once the scan must stop; stays
    /// true after that.
    pub fn should_stop(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        let exit = match self.commands.try_recv() {
            Ok(UnitCommand::Cancel { round }) if round == self.round => ScanExit::Idle,
            // A cancel for an older round is irrelevant to this scan
            Ok(UnitCommand::Cancel { .. }) | Err(TryRecvError::Empty) => return false,
            Ok(UnitCommand::Shutdown) | Err(TryRecvError::Disconnected) => ScanExit::Shutdown,
            Ok(command @ UnitCommand::Search { .. }) => ScanExit::Deferred(command),
        };
        self.stopped = true;
        self.exit = Some(exit);
        true
    }

    pub(crate) fn finish(self) -> ScanExit {
        self.exit.unwrap_or(ScanExit::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use fractalchain_core::{Hash, Transaction};

    fn template(difficulty: u32) -> Block {
        Block::new(1, Hash::ZERO, vec![Transaction::reward("node", 50)], difficulty)
    }

    #[test]
    fn test_header_scan_finds_first_valid_nonce_in_range() {
        let (_tx, rx) = unbounded();
        let mut ctx = ScanContext::new(0, 1, &rx);
        let template = template(1);
        let range = NonceRange::new(100, 100_000);

        let SearchOutcome::Found(block) = HeaderScan.search(&template, range, &mut ctx) else {
            panic!("difficulty 1 should be found");
        };
        assert!(range.contains(block.nonce));
        assert!(block.meets_target());
        assert_eq!(block.hash, block.compute_hash());
        assert_eq!(ctx.hashes(), block.nonce - range.start + 1);

        // Every earlier nonce in the range fails the target
        let mut probe = template.clone();
        for nonce in range.start..block.nonce {
            probe.seal(nonce);
            assert!(!probe.meets_target());
        }
    }

    #[test]
    fn test_header_scan_exhausts_range() {
        let (_tx, rx) = unbounded();
        let mut ctx = ScanContext::new(0, 1, &rx);
        let outcome = HeaderScan.search(&template(64), NonceRange::new(0, 50), &mut ctx);
        assert_eq!(outcome, SearchOutcome::Exhausted);
        assert_eq!(ctx.hashes(), 50);
    }

    #[test]
    fn test_cancel_observed_before_first_hash() {
        let (tx, rx) = unbounded();
        tx.send(UnitCommand::Cancel { round: 3 }).unwrap();

        let mut ctx = ScanContext::new(0, 3, &rx);
        let outcome = HeaderScan.search(&template(64), NonceRange::new(0, 1_000_000), &mut ctx);
        assert_eq!(outcome, SearchOutcome::Cancelled);
        assert_eq!(ctx.hashes(), 0);
        assert!(matches!(ctx.finish(), ScanExit::Idle));
    }

    #[test]
    fn test_stale_cancel_ignored() {
        let (tx, rx) = unbounded();
        tx.send(UnitCommand::Cancel { round: 2 }).unwrap();

        let mut ctx = ScanContext::new(0, 3, &rx);
        let outcome = HeaderScan.search(&template(64), NonceRange::new(0, 10), &mut ctx);
        assert_eq!(outcome, SearchOutcome::Exhausted);
    }

    #[test]
    fn test_new_search_supersedes_scan() {
        let (tx, rx) = unbounded();
        tx.send(UnitCommand::Search {
            round: 4,
            range: NonceRange::new(0, 1),
            template: template(1),
        })
        .unwrap();

        let mut ctx = ScanContext::new(0, 3, &rx);
        assert!(ctx.should_stop());
        assert!(ctx.should_stop());
        assert!(matches!(
            ctx.finish(),
            ScanExit::Deferred(UnitCommand::Search { round: 4, .. })
        ));
    }

    #[test]
    fn test_shutdown_and_disconnect_stop_scan() {
        let (tx, rx) = unbounded();
        tx.send(UnitCommand::Shutdown).unwrap();
        let mut ctx = ScanContext::new(0, 1, &rx);
        assert!(ctx.should_stop());
        assert!(matches!(ctx.finish(), ScanExit::Shutdown));

        let (tx, rx) = unbounded::<UnitCommand>();
        drop(tx);
        let mut ctx = ScanContext::new(0, 1, &rx);
        assert!(ctx.should_stop());
        assert!(matches!(ctx.finish(), ScanExit::Shutdown));
    }
}
