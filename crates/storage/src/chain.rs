//! Append-only block log on sled.
//!
//! Each commit writes exactly one new block record plus the head pointer in a
//! single atomic batch, instead of rewriting the whole ledger.

use crate::db::{BatchOp, Result, Storage, StorageError};
use crate::store::LedgerStore;
use fractalchain_core::Block;
use std::path::Path;

/// Key holding the height of the last committed block.
const CHAIN_HEIGHT_KEY: &[u8] = b"chain:height";

/// Ledger persisted as a keyed block log.
pub struct SledStore {
    storage: Storage,
    location: String,
}

impl SledStore {
    /// Open (or create) a block log at the given directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let storage = Storage::open(path.as_ref())?;
        Ok(Self {
            storage,
            location: path.as_ref().display().to_string(),
        })
    }

    /// In-memory log (for testing).
    pub fn open_temporary() -> Result<Self> {
        Ok(Self {
            storage: Storage::open_temporary()?,
            location: "<temporary>".into(),
        })
    }

    /// Height of the last committed block, if any.
    pub fn get_height(&self) -> Result<Option<u64>> {
        self.storage.get(CHAIN_HEIGHT_KEY)
    }

    /// Get a block by its height.
    pub fn get_block_by_height(&self, height: u64) -> Result<Option<Block>> {
        self.storage.get(Storage::block_height_key(height))
    }

    fn write(&self, blocks: &[Block]) -> Result<()> {
        let Some(last) = blocks.last() else {
            return Ok(());
        };
        let mut ops = Vec::with_capacity(blocks.len() + 1);
        for block in blocks {
            ops.push(BatchOp::insert(Storage::block_height_key(block.index), block)?);
        }
        ops.push(BatchOp::insert(CHAIN_HEIGHT_KEY.to_vec(), &last.index)?);
        self.storage.batch(ops)?;
        self.storage.flush()
    }
}

impl LedgerStore for SledStore {
    fn load(&self) -> Result<Option<Vec<Block>>> {
        let Some(height) = self.get_height()? else {
            return Ok(None);
        };

        let mut blocks = Vec::with_capacity(height as usize + 1);
        for index in 0..=height {
            let block = self
                .get_block_by_height(index)
                .map_err(|e| StorageError::Corrupt(format!("block {index}: {e}")))?
                .ok_or_else(|| StorageError::Corrupt(format!("block {index} missing from log")))?;
            if block.index != index {
                return Err(StorageError::Corrupt(format!(
                    "block stored at height {index} claims index {}",
                    block.index
                )));
            }
            blocks.push(block);
        }
        Ok(Some(blocks))
    }

    fn save(&self, blocks: &[Block]) -> Result<()> {
        self.write(blocks)
    }

    fn append(&self, block: &Block, _chain: &[Block]) -> Result<()> {
        self.write(std::slice::from_ref(block))
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractalchain_core::Transaction;

    fn chain_of(len: u64) -> Vec<Block> {
        let mut blocks = vec![Block::genesis(1)];
        for i in 1..len {
            let parent = &blocks[i as usize - 1];
            let mut block = Block::new(i, parent.hash, vec![Transaction::reward("node", 50)], 1);
            block.seal(i);
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn test_empty_log_loads_none() {
        let store = SledStore::open_temporary().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_append() {
        let store = SledStore::open_temporary().unwrap();
        let chain = chain_of(3);

        store.save(&chain[..2]).unwrap();
        assert_eq!(store.get_height().unwrap(), Some(1));

        store.append(&chain[2], &chain).unwrap();
        assert_eq!(store.get_height().unwrap(), Some(2));
        assert_eq!(store.load().unwrap().unwrap(), chain);
    }

    #[test]
    fn test_missing_block_is_corrupt() {
        let store = SledStore::open_temporary().unwrap();
        store.save(&chain_of(1)).unwrap();
        store.storage.put(CHAIN_HEIGHT_KEY, &5u64).unwrap();
        assert!(matches!(store.load(), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_reopen_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let chain = chain_of(2);
        {
            let store = SledStore::open(dir.path().join("ledger.sled")).unwrap();
            store.save(&chain).unwrap();
        }
        let store = SledStore::open(dir.path().join("ledger.sled")).unwrap();
        assert_eq!(store.load().unwrap().unwrap(), chain);
    }
}
