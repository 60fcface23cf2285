//! Persistent ledger storage for fractalchain.
//!
//! Two backends implement [`LedgerStore`]:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Ledger (chain crate)                 │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │ LedgerStore
//!            ┌─────────────────┴──────────────────┐
//! ┌──────────▼───────────┐            ┌────────────▼───────────┐
//! │    JsonFileStore     │            │       SledStore        │
//! │  - one JSON array    │            │  - block per height    │
//! │  - temp file+rename  │            │  - atomic batch+flush  │
//! └──────────────────────┘            └────────────────────────┘
//! ```

pub mod chain;
pub mod db;
pub mod file;
pub mod store;

// Re-export commonly used types
pub use chain::SledStore;
pub use db::{BatchOp, Result, Storage, StorageError};
pub use file::{JsonFileStore, LEDGER_FILE_NAME};
pub use store::LedgerStore;
