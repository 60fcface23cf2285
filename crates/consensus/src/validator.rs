//! Block and chain validation rules.
//!
//! These are the only checks the ledger performs: hash linkage, Merkle
//! commitment, the retargeted difficulty and proof-of-work. Transactions are
//! not authorized or balance-checked.

use crate::difficulty::DifficultyController;
use fractalchain_core::{Block, Hash};
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("block index mismatch (expected {expected}, got {got})")]
    InvalidIndex { expected: u64, got: u64 },

    #[error("block {index} previous hash mismatch (expected {expected}, got {got})")]
    InvalidPreviousHash { index: u64, expected: Hash, got: Hash },

    #[error("block {index} merkle root verification failed")]
    InvalidMerkleRoot { index: u64 },

    #[error("block {index} stored hash does not match its header")]
    HashMismatch { index: u64 },

    #[error("block {index} declares difficulty {got}, chain requires {expected}")]
    InvalidDifficulty { index: u64, expected: u32, got: u32 },

    #[error("block {index} hash {hash} does not meet difficulty {difficulty}")]
    InsufficientWork { index: u64, hash: Hash, difficulty: u32 },

    #[error("candidate block does not match the round template ({field})")]
    TemplateMismatch { field: &'static str },

    #[error("invalid genesis block: {0}")]
    InvalidGenesis(&'static str),

    #[error("chain is empty")]
    EmptyChain,
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Block validator.
pub struct BlockValidator;

impl BlockValidator {
    /// Check that the stored hash is the header hash and meets the difficulty.
    pub fn validate_pow(block: &Block) -> Result<()> {
        let computed = block.compute_hash();
        if computed != block.hash {
            return Err(ValidationError::HashMismatch { index: block.index });
        }
        if !computed.meets_difficulty(block.difficulty) {
            return Err(ValidationError::InsufficientWork {
                index: block.index,
                hash: computed,
                difficulty: block.difficulty,
            });
        }
        Ok(())
    }

    /// Check that the merkle root commits to the stored transactions.
    pub fn validate_merkle_root(block: &Block) -> Result<()> {
        if !block.verify_merkle_root() {
            return Err(ValidationError::InvalidMerkleRoot { index: block.index });
        }
        Ok(())
    }

    /// Check that the block declares the difficulty its chain prescribes.
    pub fn validate_difficulty(block: &Block, expected: u32) -> Result<()> {
        if block.difficulty != expected {
            return Err(ValidationError::InvalidDifficulty {
                index: block.index,
                expected,
                got: block.difficulty,
            });
        }
        Ok(())
    }

    /// Validate a block as the direct successor of `parent`.
    ///
    /// Only linkage and work are checked here; the declared difficulty
    /// depends on the whole preceding chain, see [`Self::validate_difficulty`].
    pub fn validate_successor(block: &Block, parent: &Block) -> Result<()> {
        let expected = parent.index + 1;
        if block.index != expected {
            return Err(ValidationError::InvalidIndex {
                expected,
                got: block.index,
            });
        }
        if block.previous_hash != parent.hash {
            return Err(ValidationError::InvalidPreviousHash {
                index: block.index,
                expected: parent.hash,
                got: block.previous_hash,
            });
        }
        Self::validate_merkle_root(block)?;
        Self::validate_pow(block)?;
        Ok(())
    }

    /// Validate a genesis block: index 0, zero parent, consistent hash.
    ///
    /// Genesis is synthesized, not mined, so no proof-of-work is required.
    pub fn validate_genesis(block: &Block) -> Result<()> {
        if block.index != 0 {
            return Err(ValidationError::InvalidGenesis("index must be 0"));
        }
        if block.previous_hash != Hash::ZERO {
            return Err(ValidationError::InvalidGenesis("previous hash must be zero"));
        }
        Self::validate_merkle_root(block)?;
        if block.compute_hash() != block.hash {
            return Err(ValidationError::HashMismatch { index: 0 });
        }
        Ok(())
    }

    /// Re-verify a search unit's reported solution against the round template.
    ///
    /// Everything except `nonce` and `hash` must be identical to the template,
    /// which rejects reports from an earlier round as well as corrupted ones.
    pub fn validate_solution(template: &Block, candidate: &Block) -> Result<()> {
        let field = if candidate.index != template.index {
            Some("index")
        } else if candidate.previous_hash != template.previous_hash {
            Some("previousHash")
        } else if candidate.timestamp != template.timestamp {
            Some("timestamp")
        } else if candidate.merkle_root != template.merkle_root {
            Some("merkleRoot")
        } else if candidate.difficulty != template.difficulty {
            Some("difficulty")
        } else if candidate.transactions != template.transactions {
            Some("transactions")
        } else {
            None
        };
        if let Some(field) = field {
            return Err(ValidationError::TemplateMismatch { field });
        }
        Self::validate_pow(candidate)
    }
}

/// Whole-chain validator.
pub struct ChainValidator;

impl ChainValidator {
    /// Validate an ordered chain from genesis to tip under the default retarget rule.
    pub fn validate_chain(blocks: &[Block]) -> Result<()> {
        Self::validate_chain_with(blocks, &DifficultyController::default())
    }

    /// Validate an ordered chain, replaying `controller` to check every
    /// block's declared difficulty.
    pub fn validate_chain_with(blocks: &[Block], controller: &DifficultyController) -> Result<()> {
        let genesis = blocks.first().ok_or(ValidationError::EmptyChain)?;
        BlockValidator::validate_genesis(genesis)?;
        for i in 1..blocks.len() {
            let (block, parent) = (&blocks[i], &blocks[i - 1]);
            BlockValidator::validate_successor(block, parent)?;
            // Every earlier block is linked, so positions match indices
            let expected = controller
                .next_difficulty(&blocks[..i])
                .unwrap_or(parent.difficulty);
            BlockValidator::validate_difficulty(block, expected)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::ADJUSTMENT_INTERVAL;
    use fractalchain_core::Transaction;

    fn mine(mut block: Block) -> Block {
        for nonce in 0.. {
            block.seal(nonce);
            if block.meets_target() {
                return block;
            }
        }
        unreachable!()
    }

    fn child_of(parent: &Block) -> Block {
        let txs = vec![Transaction::new("alice", "bob", 5, ""), Transaction::reward("node", 50)];
        mine(Block::new(parent.index + 1, parent.hash, txs, 1))
    }

    #[test]
    fn test_valid_successor() {
        let genesis = Block::genesis(1);
        let block = child_of(&genesis);
        assert_eq!(BlockValidator::validate_successor(&block, &genesis), Ok(()));
    }

    #[test]
    fn test_wrong_index() {
        let genesis = Block::genesis(1);
        let mut block = child_of(&genesis);
        block.index = 5;
        assert_eq!(
            BlockValidator::validate_successor(&block, &genesis),
            Err(ValidationError::InvalidIndex { expected: 1, got: 5 })
        );
    }

    #[test]
    fn test_wrong_previous_hash() {
        let genesis = Block::genesis(1);
        let block = mine(Block::new(1, Hash::ZERO, vec![], 1));
        assert!(matches!(
            BlockValidator::validate_successor(&block, &genesis),
            Err(ValidationError::InvalidPreviousHash { .. })
        ));
    }

    #[test]
    fn test_tampered_transactions() {
        let genesis = Block::genesis(1);
        let mut block = child_of(&genesis);
        block.transactions[0].amount = 500;
        assert_eq!(
            BlockValidator::validate_successor(&block, &genesis),
            Err(ValidationError::InvalidMerkleRoot { index: 1 })
        );
    }

    #[test]
    fn test_hash_mismatch() {
        let genesis = Block::genesis(1);
        let mut block = child_of(&genesis);
        block.nonce += 1;
        assert_eq!(
            BlockValidator::validate_pow(&block),
            Err(ValidationError::HashMismatch { index: 1 })
        );
    }

    #[test]
    fn test_insufficient_work() {
        let genesis = Block::genesis(1);
        let mut block = Block::new(1, genesis.hash, vec![], 64);
        block.seal(0);
        assert!(matches!(
            BlockValidator::validate_pow(&block),
            Err(ValidationError::InsufficientWork { difficulty: 64, .. })
        ));
    }

    #[test]
    fn test_solution_must_match_template() {
        let genesis = Block::genesis(1);
        let template = Block::new(1, genesis.hash, vec![Transaction::reward("node", 50)], 1);
        let solved = mine(template.clone());
        assert_eq!(BlockValidator::validate_solution(&template, &solved), Ok(()));

        // A solution for a different template (e.g. an older round)
        let mut stale = template.clone();
        stale.timestamp -= 1;
        let stale = mine(stale);
        assert_eq!(
            BlockValidator::validate_solution(&template, &stale),
            Err(ValidationError::TemplateMismatch { field: "timestamp" })
        );

        // An unsealed report
        assert_eq!(
            BlockValidator::validate_solution(&template, &template),
            Err(ValidationError::HashMismatch { index: 1 })
        );
    }

    #[test]
    fn test_validate_chain() {
        let genesis = Block::genesis(1);
        let b1 = child_of(&genesis);
        let b2 = child_of(&b1);
        let chain = vec![genesis, b1, b2];
        assert_eq!(ChainValidator::validate_chain(&chain), Ok(()));

        let mut broken = chain.clone();
        broken[1].timestamp += 1;
        assert!(ChainValidator::validate_chain(&broken).is_err());
    }

    #[test]
    fn test_validate_difficulty() {
        let genesis = Block::genesis(3);
        let block = mine(Block::new(1, genesis.hash, vec![], 0));
        assert_eq!(BlockValidator::validate_difficulty(&block, 0), Ok(()));
        assert_eq!(
            BlockValidator::validate_difficulty(&block, 3),
            Err(ValidationError::InvalidDifficulty {
                index: 1,
                expected: 3,
                got: 0
            })
        );
    }

    #[test]
    fn test_validate_chain_rejects_lowered_difficulty() {
        let genesis = Block::genesis(1);
        // Linkage and work are fine at difficulty 0, but the chain requires 1
        let cheap = mine(Block::new(1, genesis.hash, vec![Transaction::reward("node", 50)], 0));
        assert_eq!(BlockValidator::validate_successor(&cheap, &genesis), Ok(()));

        let chain = vec![genesis, cheap];
        assert_eq!(
            ChainValidator::validate_chain(&chain),
            Err(ValidationError::InvalidDifficulty {
                index: 1,
                expected: 1,
                got: 0
            })
        );
    }

    #[test]
    fn test_validate_chain_follows_retarget() {
        let mut chain = vec![Block::genesis(1)];
        while chain.len() <= ADJUSTMENT_INTERVAL as usize {
            let next = child_of(chain.last().unwrap());
            chain.push(next);
        }
        assert_eq!(ChainValidator::validate_chain(&chain), Ok(()));

        // The window was mined far faster than target, so block 11 must step up
        let tip = chain.last().unwrap().clone();
        let mut stale = chain.clone();
        stale.push(child_of(&tip));
        assert_eq!(
            ChainValidator::validate_chain(&stale),
            Err(ValidationError::InvalidDifficulty {
                index: 11,
                expected: 2,
                got: 1
            })
        );

        chain.push(mine(Block::new(11, tip.hash, vec![], 2)));
        assert_eq!(ChainValidator::validate_chain(&chain), Ok(()));
    }

    #[test]
    fn test_validate_chain_empty() {
        assert_eq!(ChainValidator::validate_chain(&[]), Err(ValidationError::EmptyChain));
    }

    #[test]
    fn test_genesis_checks() {
        let mut genesis = Block::genesis(5);
        assert_eq!(BlockValidator::validate_genesis(&genesis), Ok(()));
        genesis.previous_hash = Hash([1; 32]);
        assert!(matches!(
            BlockValidator::validate_genesis(&genesis),
            Err(ValidationError::InvalidGenesis(_))
        ));
    }
}
