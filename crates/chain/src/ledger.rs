//! The canonical, append-only block sequence.
//!
//! A `Ledger` is owned by exactly one writer (the mining coordinator). It
//! validates every block before accepting it and persists after every append.

use fractalchain_consensus::{BlockValidator, ChainValidator, DifficultyController, ValidationError};
use fractalchain_core::{Block, Hash};
use fractalchain_storage::{LedgerStore, StorageError};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("persisted ledger at {location} is unusable: {source}")]
    Corrupt {
        location: String,
        #[source]
        source: StorageError,
    },

    #[error("persisted ledger at {location} failed validation: {source}")]
    InvalidChain {
        location: String,
        #[source]
        source: ValidationError,
    },

    #[error("rejected block: {0}")]
    Rejected(#[from] ValidationError),

    #[error("block {index} committed in memory but could not be persisted: {source}")]
    Persist {
        index: u64,
        #[source]
        source: StorageError,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Ordered, hash-linked block sequence backed by a [`LedgerStore`].
pub struct Ledger {
    blocks: Vec<Block>,
    store: Box<dyn LedgerStore>,
    difficulty: DifficultyController,
}

impl Ledger {
    /// Load the persisted chain, or synthesize and persist a genesis block if
    /// nothing has been persisted yet.
    ///
    /// Unreadable or invalid persisted state is an error: a fresh genesis is
    /// never written over existing data.
    pub fn open(store: Box<dyn LedgerStore>, genesis_difficulty: u32) -> Result<Self> {
        let location = store.location();
        let difficulty = DifficultyController::default();
        let loaded = store.load().map_err(|source| LedgerError::Corrupt {
            location: location.clone(),
            source,
        })?;

        match loaded {
            Some(blocks) => {
                ChainValidator::validate_chain_with(&blocks, &difficulty).map_err(|source| {
                    LedgerError::InvalidChain {
                        location: location.clone(),
                        source,
                    }
                })?;
                tracing::info!(%location, blocks = blocks.len(), "loaded ledger");
                Ok(Self {
                    blocks,
                    store,
                    difficulty,
                })
            }
            None => {
                let genesis = Block::genesis(genesis_difficulty);
                store.save(std::slice::from_ref(&genesis))?;
                tracing::info!(
                    %location,
                    difficulty = genesis_difficulty,
                    hash = %genesis.hash,
                    "created genesis block"
                );
                Ok(Self {
                    blocks: vec![genesis],
                    store,
                    difficulty,
                })
            }
        }
    }

    /// The most recent block.
    pub fn tip(&self) -> &Block {
        // open() guarantees at least the genesis block
        &self.blocks[self.blocks.len() - 1]
    }

    /// Block at the given index.
    pub fn block_at(&self, index: u64) -> Option<&Block> {
        self.blocks.get(usize::try_from(index).ok()?)
    }

    /// Find a block by its hash.
    pub fn find_by_hash(&self, hash: &Hash) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.hash == hash)
    }

    /// All blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Index of the tip.
    pub fn height(&self) -> u64 {
        self.tip().index
    }

    /// Number of blocks including genesis.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false: a ledger holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Where the ledger is persisted.
    pub fn location(&self) -> String {
        self.store.location()
    }

    /// Difficulty required of the next block.
    pub fn next_difficulty(&self) -> u32 {
        self.difficulty
            .next_difficulty(&self.blocks)
            .unwrap_or(self.tip().difficulty)
    }

    /// Validate `block` as the tip's successor, append it and persist.
    ///
    /// The block must declare exactly [`Ledger::next_difficulty`].
    ///
    /// A rejected block leaves the ledger untouched. A persistence failure is
    /// reported as [`LedgerError::Persist`] with the block already appended in
    /// memory, so the caller can retry [`Ledger::persist`].
    pub fn append(&mut self, block: Block) -> Result<()> {
        BlockValidator::validate_successor(&block, self.tip())?;
        BlockValidator::validate_difficulty(&block, self.next_difficulty())?;

        let index = block.index;
        self.blocks.push(block);

        self.store
            .append(self.tip(), &self.blocks)
            .map_err(|source| LedgerError::Persist { index, source })?;

        tracing::info!(index, hash = %self.tip().hash, "block appended");
        Ok(())
    }

    /// Write the full chain to the store.
    pub fn persist(&self) -> Result<()> {
        self.store
            .save(&self.blocks)
            .map_err(|source| LedgerError::Persist {
                index: self.height(),
                source,
            })
    }
}
