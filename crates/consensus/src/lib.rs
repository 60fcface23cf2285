//! Proof-of-work consensus rules for fractalchain.
//!
//! This crate provides:
//! - Difficulty retargeting from recent block timing
//! - Block validation (linkage, Merkle commitment, proof-of-work)
//! - Re-verification of mined solutions against their round template
//!
//! # Example
//!
//! ```rust
//! use fractalchain_consensus::{BlockValidator, DifficultyController};
//! use fractalchain_core::Block;
//!
//! let genesis = Block::genesis(1);
//! let controller = DifficultyController::default();
//! let difficulty = controller.next_difficulty(std::slice::from_ref(&genesis)).unwrap();
//!
//! let mut block = Block::new(1, genesis.hash, vec![], difficulty);
//! let mut nonce = 0;
//! block.seal(nonce);
//! while !block.meets_target() {
//!     nonce += 1;
//!     block.seal(nonce);
//! }
//! BlockValidator::validate_successor(&block, &genesis).unwrap();
//! ```

pub mod difficulty;
pub mod validator;

// Re-export commonly used types
pub use difficulty::{
    DifficultyController, ADJUSTMENT_INTERVAL, MIN_DIFFICULTY, TARGET_BLOCK_TIME_MS,
};
pub use validator::{BlockValidator, ChainValidator, ValidationError};
