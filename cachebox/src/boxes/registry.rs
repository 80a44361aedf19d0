//! Registry of box names, stored as one ledger entry.
//!
//! The registry is a durable set with list representation. It may lag behind
//! the box records (a crash between writes can leave a registered name with
//! no record); readers treat a registered name without a record as an empty
//! box, so the record stays authoritative for membership.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::record::{box_key, BoxRecord};
use crate::ledger::{Ledger, LedgerError, LedgerExt};

/// Box name used when a caller does not name one.
pub const DEFAULT_BOX_NAME: &str = "default";

/// Ledger key holding the registry set.
pub const DEFAULT_REGISTRY_KEY: &str = "boxes:registry";

/// Durable set of every box name created and not yet purged.
#[derive(Clone)]
pub struct BoxRegistry {
    ledger: Arc<dyn Ledger>,
    key: String,
}

impl BoxRegistry {
    /// Create a registry stored under `key` in `ledger`.
    ///
    /// Call [`init`](Self::init) once per session before use.
    pub fn new(ledger: Arc<dyn Ledger>, key: impl Into<String>) -> Self {
        Self {
            ledger,
            key: key.into(),
        }
    }

    /// The ledger key holding the registry.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Create the empty registry if it does not exist yet.
    ///
    /// # Returns
    ///
    /// `true` if the registry was created by this call.
    pub fn init(&self) -> Result<bool, LedgerError> {
        let created = self.ledger.init(&self.key, Value::Array(Vec::new()))?;
        if created {
            debug!(key = %self.key, "Initialized box registry");
        }
        Ok(created)
    }

    /// Registered box names in durable insertion order.
    pub fn list_all(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self
            .ledger
            .get_as::<Vec<String>>(&self.key)?
            .unwrap_or_default())
    }

    pub fn contains(&self, box_name: &str) -> Result<bool, LedgerError> {
        Ok(self.list_all()?.iter().any(|n| n == box_name))
    }

    /// Add `box_name` to the registry. Skips the write if already present.
    ///
    /// # Returns
    ///
    /// `true` if the name was newly registered.
    pub fn register(&self, box_name: &str) -> Result<bool, LedgerError> {
        let mut names = self.list_all()?;
        if names.iter().any(|n| n == box_name) {
            return Ok(false);
        }
        names.push(box_name.to_string());
        self.ledger.set_as(&self.key, &names)?;
        debug!(box_name, "Registered box");
        Ok(true)
    }

    /// Remove `box_name` from the registry and delete its record.
    pub fn unregister(&self, box_name: &str) -> Result<(), LedgerError> {
        let mut names = self.list_all()?;
        let before = names.len();
        names.retain(|n| n != box_name);
        if names.len() != before {
            self.ledger.set_as(&self.key, &names)?;
        }
        self.delete_box(box_name)?;
        debug!(box_name, "Unregistered box");
        Ok(())
    }

    /// Load the record for `box_name`, if one exists.
    pub fn load_box(&self, box_name: &str) -> Result<Option<BoxRecord>, LedgerError> {
        self.ledger.get_as(&box_key(box_name))
    }

    /// Persist the record for `box_name`.
    pub fn save_box(&self, box_name: &str, record: &BoxRecord) -> Result<(), LedgerError> {
        self.ledger.set_as(&box_key(box_name), record)
    }

    /// Delete the record for `box_name`, returning whether one existed.
    pub fn delete_box(&self, box_name: &str) -> Result<bool, LedgerError> {
        self.ledger.remove(&box_key(box_name))
    }

    /// Load every registered box with a record, in registration order.
    ///
    /// Registered names without a record are skipped.
    pub fn load_all(&self) -> Result<Vec<(String, BoxRecord)>, LedgerError> {
        let mut boxes = Vec::new();
        for name in self.list_all()? {
            if let Some(record) = self.load_box(&name)? {
                boxes.push((name, record));
            }
        }
        Ok(boxes)
    }

    /// Load every registered box bound to `cache_name`.
    pub fn boxes_in_namespace(
        &self,
        cache_name: &str,
    ) -> Result<Vec<(String, BoxRecord)>, LedgerError> {
        let mut boxes = self.load_all()?;
        boxes.retain(|(_, record)| record.cache_name == cache_name);
        Ok(boxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;

    fn registry() -> (Arc<MemoryLedger>, BoxRegistry) {
        let ledger = Arc::new(MemoryLedger::new());
        let registry = BoxRegistry::new(ledger.clone(), DEFAULT_REGISTRY_KEY);
        (ledger, registry)
    }

    #[test]
    fn test_init_is_idempotent() {
        let (_, registry) = registry();
        assert!(registry.init().unwrap());
        registry.register("a").unwrap();
        assert!(!registry.init().unwrap());
        assert_eq!(registry.list_all().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_list_without_init_is_empty() {
        let (_, registry) = registry();
        assert!(registry.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_register_keeps_insertion_order() {
        let (_, registry) = registry();
        registry.init().unwrap();
        assert!(registry.register("b").unwrap());
        assert!(registry.register("a").unwrap());
        assert!(!registry.register("b").unwrap());
        assert_eq!(registry.list_all().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_unregister_deletes_record() {
        let (ledger, registry) = registry();
        registry.init().unwrap();
        registry.register("a").unwrap();
        registry.save_box("a", &BoxRecord::new("c")).unwrap();

        registry.unregister("a").unwrap();

        assert!(registry.list_all().unwrap().is_empty());
        assert!(registry.load_box("a").unwrap().is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_boxes_in_namespace_filters_and_skips_missing_records() {
        let (_, registry) = registry();
        registry.init().unwrap();
        for name in ["a", "b", "c", "ghost"] {
            registry.register(name).unwrap();
        }
        registry.save_box("a", &BoxRecord::new("n1")).unwrap();
        registry.save_box("b", &BoxRecord::new("n2")).unwrap();
        registry.save_box("c", &BoxRecord::new("n1")).unwrap();

        let names: Vec<String> = registry
            .boxes_in_namespace("n1")
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);

        let all: Vec<String> = registry
            .load_all()
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(all, vec!["a", "b", "c"]);
    }
}
