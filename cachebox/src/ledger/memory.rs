//! Process-local ledger.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde_json::Value;

use super::traits::{Ledger, LedgerError};

/// Ledger held entirely in memory.
///
/// Durable for the lifetime of the value only; used by tests and by hosts
/// that rebuild their boxes every session.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Ledger for MemoryLedger {
    fn get(&self, key: &str) -> Result<Option<Value>, LedgerError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), LedgerError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, LedgerError> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn init(&self, key: &str, value: Value) -> Result<bool, LedgerError> {
        let mut entries = self.entries.write();
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerExt;
    use serde_json::json;

    #[test]
    fn test_set_get_remove() {
        let ledger = MemoryLedger::new();
        ledger.set("k", json!({"a": 1})).unwrap();
        assert_eq!(ledger.get("k").unwrap(), Some(json!({"a": 1})));
        assert!(ledger.remove("k").unwrap());
        assert!(!ledger.remove("k").unwrap());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_init_only_writes_absent_keys() {
        let ledger = MemoryLedger::new();
        assert!(ledger.init("k", json!([])).unwrap());
        ledger.set("k", json!(["x"])).unwrap();
        assert!(!ledger.init("k", json!([])).unwrap());
        assert_eq!(ledger.get("k").unwrap(), Some(json!(["x"])));
    }

    #[test]
    fn test_typed_access_rejects_wrong_shape() {
        let ledger = MemoryLedger::new();
        ledger.set("k", json!("not a list")).unwrap();
        let result: Result<Option<Vec<String>>, _> = ledger.get_as("k");
        assert!(matches!(result, Err(LedgerError::InvalidValue { .. })));
    }
}
