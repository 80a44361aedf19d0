//! In-memory content store using dashmap.
//!
//! Each namespace is a concurrent map from canonical URL to response. Entries
//! are never evicted; they live until deleted or the process exits. Useful for
//! tests and for hosts that only need a session-scoped cache.

use std::sync::Arc;

use dashmap::DashMap;

use super::fetch_batch;
use crate::cache::entry::CachedResponse;
use crate::cache::fetch::Fetcher;
use crate::cache::traits::{BoxFuture, ContentStore, StoreError, StoreHandle};

/// In-memory content store.
///
/// Handles for the same namespace share state, so a handle opened twice sees
/// the same entries.
pub struct MemoryContentStore {
    /// Namespace name to handle.
    namespaces: DashMap<String, Arc<MemoryStoreHandle>>,

    /// Fetcher used by `add_all`.
    fetcher: Arc<dyn Fetcher>,
}

impl MemoryContentStore {
    /// Create an empty store that fetches through `fetcher`.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            namespaces: DashMap::new(),
            fetcher,
        }
    }

    fn handle(&self, namespace: &str) -> Arc<MemoryStoreHandle> {
        self.namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| {
                Arc::new(MemoryStoreHandle {
                    namespace: namespace.to_string(),
                    entries: DashMap::new(),
                    fetcher: Arc::clone(&self.fetcher),
                })
            })
            .clone()
    }
}

impl ContentStore for MemoryContentStore {
    fn open(&self, namespace: &str) -> BoxFuture<'_, Result<Arc<dyn StoreHandle>, StoreError>> {
        let handle: Arc<dyn StoreHandle> = self.handle(namespace);
        Box::pin(async move { Ok(handle) })
    }

    fn namespaces(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            let mut names: Vec<String> = self.namespaces.iter().map(|e| e.key().clone()).collect();
            names.sort();
            Ok(names)
        })
    }
}

/// One namespace of the in-memory store.
pub struct MemoryStoreHandle {
    namespace: String,
    entries: DashMap<String, CachedResponse>,
    fetcher: Arc<dyn Fetcher>,
}

impl StoreHandle for MemoryStoreHandle {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn keys(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move { Ok(self.entries.iter().map(|e| e.key().clone()).collect()) })
    }

    fn match_url(&self, url: &str) -> BoxFuture<'_, Result<Option<CachedResponse>, StoreError>> {
        let found = self.entries.get(url).map(|e| e.value().clone());
        Box::pin(async move { Ok(found) })
    }

    fn add_all(&self, urls: Vec<String>) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let responses = fetch_batch(self.fetcher.as_ref(), &urls).await?;
            for response in responses {
                self.entries.insert(response.url.clone(), response);
            }
            Ok(())
        })
    }

    fn put(&self, response: CachedResponse) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.entries.insert(response.url.clone(), response);
            Ok(())
        })
    }

    fn delete(&self, url: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let existed = self.entries.remove(url).is_some();
        Box::pin(async move { Ok(existed) })
    }
}
