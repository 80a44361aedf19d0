//! Core traits for the content store.
//!
//! A `ContentStore` hands out one `StoreHandle` per namespace. Handles are a
//! minimal, domain-agnostic view of a response cache keyed by canonical URL:
//! enumerate, match, fetch-and-store in bulk, and delete.
//!
//! # Design Principles
//!
//! - **String keys**: canonical absolute URLs, human-readable in logs
//! - **Opaque values**: a [`CachedResponse`] is stored and returned as-is
//! - **Unit batches**: `add_all` stores nothing unless every fetch succeeded
//! - **Dyn-compatible**: Uses `Pin<Box<dyn Future>>` for trait object support
//!
//! # Example
//!
//! ```ignore
//! use cachebox::cache::{ContentStore, MemoryContentStore};
//!
//! let store = MemoryContentStore::new(fetcher);
//! let handle = store.open("assets-v1").await?;
//! handle.add_all(vec!["https://example.com/app.js".into()]).await?;
//! let entry = handle.match_url("https://example.com/app.js").await?;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use super::entry::CachedResponse;

/// Errors that can occur during content store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error while reading or writing entries.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fetching a URL failed (network error or non-success status).
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// An entry on disk could not be decoded.
    #[error("Corrupt entry {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// A bulk add failed as a unit.
    #[error("Batch of {total} URLs failed ({failed} fetches failed): {first}")]
    Batch {
        total: usize,
        failed: usize,
        first: Box<StoreError>,
    },
}

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Factory for per-namespace store handles.
///
/// Opening a namespace that does not exist yet creates it lazily; opening is
/// expected to be cheap and may be called once per coordinator operation.
pub trait ContentStore: Send + Sync {
    /// Open (creating if needed) the store for `namespace`.
    fn open(&self, namespace: &str) -> BoxFuture<'_, Result<Arc<dyn StoreHandle>, StoreError>>;

    /// List the namespaces currently known to the store.
    fn namespaces(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>>;
}

/// A single namespace of cached responses keyed by URL.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` for use across async tasks.
pub trait StoreHandle: Send + Sync {
    /// The namespace this handle is bound to.
    fn namespace(&self) -> &str;

    /// Enumerate every URL physically present in this namespace.
    fn keys(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>>;

    /// Look up the entry stored for `url`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(entry))` if the URL is cached
    /// - `Ok(None)` if it is not
    /// - `Err(_)` if the lookup itself failed
    fn match_url(&self, url: &str) -> BoxFuture<'_, Result<Option<CachedResponse>, StoreError>>;

    /// Fetch every URL and store the responses.
    ///
    /// Fails as a unit: if any fetch fails, nothing from the batch is stored
    /// and a single [`StoreError::Batch`] is returned. If storing fails
    /// partway, entries already written by this batch are removed again and
    /// the storage error is returned.
    fn add_all(&self, urls: Vec<String>) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Store an already-fetched response under its URL, replacing any
    /// existing entry.
    fn put(&self, response: CachedResponse) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Delete the entry for `url`.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if an entry existed and was removed
    /// - `Ok(false)` if there was nothing to remove
    fn delete(&self, url: &str) -> BoxFuture<'_, Result<bool, StoreError>>;
}

/// Collapse per-URL fetch results into one unit result.
///
/// Returns the successful responses in input order, or a [`StoreError::Batch`]
/// carrying the first failure.
pub(crate) fn collect_batch(
    results: Vec<Result<CachedResponse, StoreError>>,
) -> Result<Vec<CachedResponse>, StoreError> {
    let total = results.len();
    let mut responses = Vec::with_capacity(total);
    let mut failures = Vec::new();

    for result in results {
        match result {
            Ok(response) => responses.push(response),
            Err(e) => failures.push(e),
        }
    }

    if failures.is_empty() {
        return Ok(responses);
    }

    let failed = failures.len();
    let first = failures.swap_remove(0);
    Err(StoreError::Batch {
        total,
        failed,
        first: Box::new(first),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(url: &str) -> Result<CachedResponse, StoreError> {
        Ok(CachedResponse::new(url, 200, Vec::new(), b"ok".to_vec()))
    }

    fn failed(url: &str) -> Result<CachedResponse, StoreError> {
        Err(StoreError::Fetch {
            url: url.to_string(),
            reason: "HTTP 404".to_string(),
        })
    }

    #[test]
    fn test_collect_batch_all_ok() {
        let batch = collect_batch(vec![ok("http://x/a"), ok("http://x/b")]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].url, "http://x/a");
        assert_eq!(batch[1].url, "http://x/b");
    }

    #[test]
    fn test_collect_batch_fails_as_unit() {
        let err = collect_batch(vec![ok("http://x/a"), failed("http://x/b"), failed("http://x/c")])
            .unwrap_err();
        match err {
            StoreError::Batch {
                total,
                failed,
                first,
            } => {
                assert_eq!(total, 3);
                assert_eq!(failed, 2);
                assert!(first.to_string().contains("http://x/b"));
            }
            other => panic!("expected batch error, got {other:?}"),
        }
    }

    #[test]
    fn test_store_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
