//! JSON-file-backed ledger.
//!
//! The whole ledger is one JSON object on disk. It is loaded once when
//! opened and rewritten after every mutation: serialized to a temp file,
//! then renamed over the original so a crash leaves either the old or the
//! new document, never a torn one.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use super::traits::{Ledger, LedgerError};

/// Ledger persisted as a single JSON document.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileLedger {
    /// Open the ledger at `path`, starting empty if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened ledger");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the ledger file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), LedgerError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl Ledger for FileLedger {
    fn get(&self, key: &str) -> Result<Option<Value>, LedgerError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), LedgerError> {
        let mut entries = self.entries.lock();
        let previous = entries.insert(key.to_string(), value);
        if let Err(e) = self.persist(&entries) {
            // Keep memory in step with what is on disk
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, LedgerError> {
        let mut entries = self.entries.lock();
        let Some(previous) = entries.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&entries) {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(true)
    }

    fn init(&self, key: &str, value: Value) -> Result<bool, LedgerError> {
        let mut entries = self.entries.lock();
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value);
        if let Err(e) = self.persist(&entries) {
            entries.remove(key);
            return Err(e);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        let ledger = FileLedger::open(&path).unwrap();
        ledger.set("box:a", json!({"cacheName": "c", "urls": []})).unwrap();
        ledger.init("registry", json!(["a"])).unwrap();
        drop(ledger);

        let reopened = FileLedger::open(&path).unwrap();
        assert_eq!(reopened.get("registry").unwrap(), Some(json!(["a"])));
        assert_eq!(
            reopened.get("box:a").unwrap(),
            Some(json!({"cacheName": "c", "urls": []}))
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_remove_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");

        let ledger = FileLedger::open(&path).unwrap();
        ledger.set("k", json!(1)).unwrap();
        assert!(ledger.remove("k").unwrap());
        drop(ledger);

        let reopened = FileLedger::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap(), None);
    }

    #[test]
    fn test_open_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, b"{not json").unwrap();

        assert!(matches!(
            FileLedger::open(&path),
            Err(LedgerError::Document(_))
        ));
    }
}
