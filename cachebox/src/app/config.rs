//! Application configuration.
//!
//! `AppConfig` is the resolved, in-process form of the settings the
//! bootstrap needs. Build it from a [`ConfigFile`] or programmatically with
//! the `with_*` methods.

use std::path::PathBuf;

use crate::boxes::{DEFAULT_BOX_NAME, DEFAULT_REGISTRY_KEY};
use crate::cache::DEFAULT_FETCH_TIMEOUT_SECS;
use crate::config::{ConfigFile, StoreBackend};

/// Configuration for [`CacheBoxApp`](super::CacheBoxApp).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Which content store to build.
    pub store_backend: StoreBackend,
    /// Root directory for the disk store.
    pub store_directory: PathBuf,
    /// Ledger document path; `None` keeps the ledger in memory.
    pub ledger_path: Option<PathBuf>,
    /// Ledger key holding the registry of box names.
    pub registry_key: String,
    /// Box used when a caller passes an empty box name.
    pub default_box: String,
    /// Base URL for resolving relative URLs.
    pub base_url: Option<String>,
    /// Per-request fetch timeout.
    pub fetch_timeout_secs: u64,
}

impl AppConfig {
    /// A fully in-memory configuration: memory store, memory ledger.
    pub fn in_memory() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            store_directory: PathBuf::new(),
            ledger_path: None,
            registry_key: DEFAULT_REGISTRY_KEY.to_string(),
            default_box: DEFAULT_BOX_NAME.to_string(),
            base_url: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }

    /// Resolve from the on-disk configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            store_backend: config.store.backend,
            store_directory: config.store.directory.clone(),
            ledger_path: Some(config.ledger.path.clone()),
            registry_key: config.ledger.registry_key.clone(),
            default_box: config.ledger.default_box.clone(),
            base_url: config.fetch.base_url.clone(),
            fetch_timeout_secs: config.fetch.timeout_secs,
        }
    }

    /// Use the disk store rooted at `directory`.
    pub fn with_disk_store(mut self, directory: impl Into<PathBuf>) -> Self {
        self.store_backend = StoreBackend::Disk;
        self.store_directory = directory.into();
        self
    }

    pub fn with_store_backend(mut self, backend: StoreBackend) -> Self {
        self.store_backend = backend;
        self
    }

    /// Persist the ledger at `path`.
    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = Some(path.into());
        self
    }

    pub fn with_registry_key(mut self, key: impl Into<String>) -> Self {
        self.registry_key = key.into();
        self
    }

    pub fn with_default_box(mut self, name: impl Into<String>) -> Self {
        self.default_box = name.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_fetch_timeout(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_config_file(&ConfigFile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.store.backend = StoreBackend::None;
        file.ledger.default_box = "precache".to_string();
        file.fetch.base_url = Some("https://app.example/".to_string());
        file.fetch.timeout_secs = 7;

        let config = AppConfig::from_config_file(&file);

        assert_eq!(config.store_backend, StoreBackend::None);
        assert_eq!(config.default_box, "precache");
        assert_eq!(config.ledger_path, Some(file.ledger.path.clone()));
        assert_eq!(config.base_url.as_deref(), Some("https://app.example/"));
        assert_eq!(config.fetch_timeout_secs, 7);
    }

    #[test]
    fn test_builder_methods() {
        let config = AppConfig::in_memory()
            .with_disk_store("/tmp/store")
            .with_ledger_path("/tmp/ledger.json")
            .with_registry_key("reg")
            .with_default_box("main")
            .with_fetch_timeout(3);

        assert_eq!(config.store_backend, StoreBackend::Disk);
        assert_eq!(config.store_directory, PathBuf::from("/tmp/store"));
        assert_eq!(config.ledger_path, Some(PathBuf::from("/tmp/ledger.json")));
        assert_eq!(config.registry_key, "reg");
        assert_eq!(config.default_box, "main");
        assert_eq!(config.fetch_timeout_secs, 3);
    }

    #[test]
    fn test_in_memory_defaults() {
        let config = AppConfig::in_memory();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.ledger_path.is_none());
        assert_eq!(config.default_box, DEFAULT_BOX_NAME);
    }
}
