//! Application bootstrap.

use std::sync::Arc;

use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::boxes::BoxRegistry;
use crate::cache::{ContentStore, DiskContentStore, Fetcher, HttpFetcher, MemoryContentStore};
use crate::config::StoreBackend;
use crate::coordinator::CacheCoordinator;
use crate::ledger::{FileLedger, Ledger, MemoryLedger};
use crate::url::{Canonicalize, UrlCanonicalizer};

/// A fully wired cachebox instance.
///
/// Owns the coordinator and everything behind it. The ledger registry is
/// initialized before `start` returns, so the coordinator can be used
/// immediately.
pub struct CacheBoxApp {
    config: AppConfig,
    coordinator: CacheCoordinator,
}

impl CacheBoxApp {
    /// Start with the HTTP fetcher described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not absolute, the HTTP client
    /// cannot be built, or the ledger cannot be opened or initialized.
    pub fn start(config: AppConfig) -> Result<Self, AppError> {
        let fetcher = HttpFetcher::with_timeout(config.fetch_timeout_secs)?;
        Self::start_with_fetcher(config, Arc::new(fetcher))
    }

    /// Start with a caller-supplied fetcher.
    ///
    /// Used by embedders that already have a transport, and by tests.
    pub fn start_with_fetcher(
        config: AppConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, AppError> {
        let canonicalizer: Arc<dyn Canonicalize> = match &config.base_url {
            Some(base) => Arc::new(UrlCanonicalizer::with_base(base).ok_or_else(|| {
                AppError::Config(format!("base URL '{}' is not an absolute URL", base))
            })?),
            None => Arc::new(UrlCanonicalizer::new()),
        };

        let ledger: Arc<dyn Ledger> = match &config.ledger_path {
            Some(path) => Arc::new(FileLedger::open(path)?),
            None => Arc::new(MemoryLedger::new()),
        };

        let registry = BoxRegistry::new(ledger, config.registry_key.clone());
        if registry.init()? {
            info!(key = %config.registry_key, "Initialized empty box registry");
        }

        let store: Option<Arc<dyn ContentStore>> = match config.store_backend {
            StoreBackend::Disk => Some(Arc::new(DiskContentStore::new(
                config.store_directory.clone(),
                fetcher,
            ))),
            StoreBackend::Memory => Some(Arc::new(MemoryContentStore::new(fetcher))),
            StoreBackend::None => None,
        };

        let coordinator = match store {
            Some(store) => CacheCoordinator::new(registry, store, canonicalizer),
            None => CacheCoordinator::unsupported(registry, canonicalizer),
        }
        .with_default_box(config.default_box.clone());

        info!(
            backend = %config.store_backend,
            default_box = %config.default_box,
            "cachebox started"
        );

        Ok(Self {
            config,
            coordinator,
        })
    }

    /// The coordinator for all box operations.
    pub fn coordinator(&self) -> &CacheCoordinator {
        &self.coordinator
    }

    /// The configuration this instance was started with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MockFetcher;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_start_in_memory() {
        let app =
            CacheBoxApp::start_with_fetcher(AppConfig::in_memory(), Arc::new(MockFetcher::new()))
                .unwrap();
        let c = app.coordinator();

        assert!(c.is_supported());
        c.add_to_box("", "assets", &["https://x/a"]).await.unwrap();
        assert_eq!(c.list_boxes().unwrap(), vec!["default"]);
    }

    #[tokio::test]
    async fn test_start_without_store_is_unsupported() {
        let config = AppConfig::in_memory().with_store_backend(StoreBackend::None);
        let app = CacheBoxApp::start_with_fetcher(config, Arc::new(MockFetcher::new())).unwrap();

        assert!(!app.coordinator().is_supported());
        assert!(app
            .coordinator()
            .add_to_box("b", "n", &["https://x/a"])
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let config = AppConfig::in_memory().with_base_url("not a url");
        let result = CacheBoxApp::start_with_fetcher(config, Arc::new(MockFetcher::new()));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_disk_state_survives_restart() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::in_memory()
            .with_disk_store(dir.path().join("store"))
            .with_ledger_path(dir.path().join("ledger.json"));

        {
            let app = CacheBoxApp::start_with_fetcher(config.clone(), Arc::new(MockFetcher::new()))
                .unwrap();
            app.coordinator()
                .add_to_box("precache", "v1", &["https://x/a", "https://x/b"])
                .await
                .unwrap();
        }

        let app = CacheBoxApp::start_with_fetcher(config, Arc::new(MockFetcher::new())).unwrap();
        let c = app.coordinator();
        assert_eq!(c.list_boxes().unwrap(), vec!["precache"]);
        assert_eq!(c.get_cache_name_for_box("precache").unwrap().as_deref(), Some("v1"));
        let entries = c.get_all_in_box("precache").await.unwrap();
        assert_eq!(entries.len(), 2);
    }
}
