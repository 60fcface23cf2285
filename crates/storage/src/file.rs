//! JSON snapshot store.
//!
//! The ledger is a single pretty-printed JSON array of blocks. Every save
//! writes a sibling temp file, syncs it, and renames it over the old file.

use crate::db::{Result, StorageError};
use crate::store::LedgerStore;
use fractalchain_core::Block;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default ledger file name inside a data directory.
pub const LEDGER_FILE_NAME: &str = "fractal_chain.json";

/// Ledger persisted as one JSON array file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at an explicit file path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at `<data_dir>/fractal_chain.json`.
    pub fn in_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir.as_ref().join(LEDGER_FILE_NAME))
    }

    /// Path of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Option<Vec<Block>>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Corrupt(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )))
            }
        };

        let blocks: Vec<Block> = serde_json::from_slice(&contents).map_err(|e| {
            StorageError::Corrupt(format!("cannot parse {}: {e}", self.path.display()))
        })?;

        if blocks.is_empty() {
            return Err(StorageError::Corrupt(format!(
                "{} contains no blocks",
                self.path.display()
            )));
        }

        tracing::debug!(path = %self.path.display(), blocks = blocks.len(), "loaded ledger file");
        Ok(Some(blocks))
    }

    fn save(&self, blocks: &[Block]) -> Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, blocks)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;

        tracing::debug!(path = %self.path.display(), blocks = blocks.len(), "ledger file written");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractalchain_core::Transaction;

    fn sample_chain() -> Vec<Block> {
        let genesis = Block::genesis(2);
        let mut next = Block::new(
            1,
            genesis.hash,
            vec![
                Transaction::new("alice", "bob", 7, "coffee"),
                Transaction::reward("node", 50),
            ],
            2,
        );
        next.seal(42);
        vec![genesis, next]
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_reload_field_for_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        let chain = sample_chain();

        store.save(&chain).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, chain);
    }

    #[test]
    fn test_file_is_json_array_with_hex_digests() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        let chain = sample_chain();
        store.save(&chain).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[1]["index"], 1);
        assert_eq!(array[1]["previousHash"], chain[0].hash.to_hex());
        assert_eq!(array[1]["hash"], chain[1].hash.to_hex());
    }

    #[test]
    fn test_malformed_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(store.path(), b"[{\"index\": 0,").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_empty_array_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        fs::write(store.path(), b"[]").unwrap();
        assert!(matches!(store.load(), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path());
        let chain = sample_chain();

        store.save(&chain[..1]).unwrap();
        store.append(&chain[1], &chain).unwrap();
        assert_eq!(store.load().unwrap().unwrap().len(), 2);

        // No temp files are left behind next to the ledger
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::in_dir(dir.path().join("nested").join("data"));
        store.save(&sample_chain()).unwrap();
        assert!(store.path().exists());
    }
}
