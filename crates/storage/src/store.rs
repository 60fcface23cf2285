//! The persistence seam used by the ledger.

use crate::db::Result;
use fractalchain_core::Block;

/// Durable storage for an ordered block sequence.
///
/// Implementations must leave the previously persisted state readable if a
/// write is interrupted.
pub trait LedgerStore: Send {
    /// Load the persisted chain in ascending index order.
    ///
    /// Returns `Ok(None)` when nothing has ever been persisted. Unreadable or
    /// malformed state is an error, never `None`.
    fn load(&self) -> Result<Option<Vec<Block>>>;

    /// Persist the full chain, replacing whatever was stored before.
    fn save(&self, blocks: &[Block]) -> Result<()>;

    /// Persist a newly appended block. `chain` already ends with `block`.
    ///
    /// Snapshot stores rewrite everything; log stores only write the new block.
    fn append(&self, _block: &Block, chain: &[Block]) -> Result<()> {
        self.save(chain)
    }

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}
