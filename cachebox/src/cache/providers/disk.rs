//! On-disk content store.
//!
//! # Layout
//!
//! ```text
//! {root}/
//! └── ns-{sha256(namespace)[..16]}/
//!     ├── NAMESPACE                  # the namespace name, for listing
//!     ├── {sha256(url)}.url          # the URL, read when listing keys
//!     └── {sha256(url)}.entry        # bincode-encoded CachedResponse
//! ```
//!
//! Every file is written to a uniquely named temp file and renamed into
//! place, so a reader never observes a half-written file and concurrent
//! writers of the same URL never share a temp file. The `.url` sidecar is
//! written before the entry and removed after it.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, warn};

use super::fetch_batch;
use crate::cache::entry::CachedResponse;
use crate::cache::fetch::Fetcher;
use crate::cache::traits::{BoxFuture, ContentStore, StoreError, StoreHandle};

const NAMESPACE_MARKER: &str = "NAMESPACE";
const ENTRY_EXTENSION: &str = "entry";
const URL_EXTENSION: &str = "url";

/// Sequence for temp file names, unique within the process.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Content store persisting entries under a root directory.
pub struct DiskContentStore {
    root: PathBuf,
    fetcher: Arc<dyn Fetcher>,
}

impl DiskContentStore {
    /// Create a store rooted at `root`. The directory is created on first use.
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            root: root.into(),
            fetcher,
        }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: &str) -> PathBuf {
        let digest = hex_digest(namespace);
        self.root.join(format!("ns-{}", &digest[..16]))
    }
}

impl ContentStore for DiskContentStore {
    fn open(&self, namespace: &str) -> BoxFuture<'_, Result<Arc<dyn StoreHandle>, StoreError>> {
        let namespace = namespace.to_string();
        Box::pin(async move {
            let dir = self.namespace_dir(&namespace);
            fs::create_dir_all(&dir).await?;

            let marker = dir.join(NAMESPACE_MARKER);
            if fs::metadata(&marker).await.is_err() {
                fs::write(&marker, namespace.as_bytes()).await?;
            }

            let handle: Arc<dyn StoreHandle> = Arc::new(DiskStoreHandle {
                namespace,
                dir,
                fetcher: Arc::clone(&self.fetcher),
            });
            Ok(handle)
        })
    }

    fn namespaces(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            let mut names = Vec::new();
            let mut dirs = match fs::read_dir(&self.root).await {
                Ok(dirs) => dirs,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(names),
                Err(e) => return Err(e.into()),
            };

            while let Some(dir) = dirs.next_entry().await? {
                match fs::read_to_string(dir.path().join(NAMESPACE_MARKER)).await {
                    Ok(name) => names.push(name),
                    Err(e) => debug!(path = %dir.path().display(), error = %e, "Skipping non-namespace directory"),
                }
            }

            names.sort();
            Ok(names)
        })
    }
}

/// One namespace directory of the disk store.
pub struct DiskStoreHandle {
    namespace: String,
    dir: PathBuf,
    fetcher: Arc<dyn Fetcher>,
}

impl DiskStoreHandle {
    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", hex_digest(url), ENTRY_EXTENSION))
    }

    async fn read_entry(path: &Path) -> Result<Option<CachedResponse>, StoreError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// URL for an entry file, from its sidecar.
    ///
    /// Entries without a sidecar are decoded instead.
    async fn read_key(entry_path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(entry_path.with_extension(URL_EXTENSION)).await {
            Ok(url) => Ok(Some(url)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Ok(Self::read_entry(entry_path).await?.map(|r| r.url))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write_entry(&self, response: &CachedResponse) -> Result<(), StoreError> {
        let path = self.entry_path(&response.url);
        let bytes = bincode::serialize(response).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let url_path = path.with_extension(URL_EXTENSION);
        write_atomic(&url_path, response.url.as_bytes()).await?;
        if let Err(e) = write_atomic(&path, &bytes).await {
            let entry_exists = fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false);
            if !entry_exists {
                remove_if_exists(&url_path).await?;
            }
            return Err(e.into());
        }
        Ok(())
    }
}

impl StoreHandle for DiskStoreHandle {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn keys(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            let mut urls = Vec::new();
            let mut entries = match fs::read_dir(&self.dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(urls),
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                    continue;
                }
                match Self::read_key(&path).await {
                    Ok(Some(url)) => urls.push(url),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Skipping unreadable cache entry"),
                }
            }

            Ok(urls)
        })
    }

    fn match_url(&self, url: &str) -> BoxFuture<'_, Result<Option<CachedResponse>, StoreError>> {
        let path = self.entry_path(url);
        let url = url.to_string();
        Box::pin(async move {
            // A digest collision would surface as an entry for another URL.
            Ok(Self::read_entry(&path).await?.filter(|r| r.url == url))
        })
    }

    fn add_all(&self, urls: Vec<String>) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let responses = fetch_batch(self.fetcher.as_ref(), &urls).await?;
            for (written, response) in responses.iter().enumerate() {
                if let Err(e) = self.write_entry(response).await {
                    warn!(
                        namespace = %self.namespace,
                        url = %response.url,
                        error = %e,
                        "Write failed, rolling back batch"
                    );
                    for stored in &responses[..written] {
                        if let Err(e) = self.delete(&stored.url).await {
                            warn!(url = %stored.url, error = %e, "Failed to roll back entry");
                        }
                    }
                    return Err(e);
                }
            }
            debug!(namespace = %self.namespace, count = responses.len(), "Stored batch");
            Ok(())
        })
    }

    fn put(&self, response: CachedResponse) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move { self.write_entry(&response).await })
    }

    fn delete(&self, url: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let path = self.entry_path(url);
        Box::pin(async move {
            let removed = remove_if_exists(&path).await?;
            remove_if_exists(&path.with_extension(URL_EXTENSION)).await?;
            Ok(removed)
        })
    }
}

/// Write `bytes` to a fresh temp file beside `path`, then rename it over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let temp_path = path.with_extension(format!("{}-{}.tmp", std::process::id(), seq));

    let result = match fs::write(&temp_path, bytes).await {
        Ok(()) => fs::rename(&temp_path, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        let _ = fs::remove_file(&temp_path).await;
    }
    result
}

/// Remove `path`, returning whether it existed.
async fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Lowercase hex SHA-256 of `input`.
fn hex_digest(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::fetch::tests::MockFetcher;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> (Arc<MockFetcher>, DiskContentStore) {
        let fetcher = Arc::new(MockFetcher::new());
        let store = DiskContentStore::new(dir.path().join("store"), fetcher.clone());
        (fetcher, store)
    }

    #[test]
    fn test_hex_digest_is_stable() {
        assert_eq!(hex_digest("abc").len(), 64);
        assert_eq!(hex_digest("abc"), hex_digest("abc"));
        assert_ne!(hex_digest("abc"), hex_digest("abd"));
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store(&dir);

        let handle = store.open("assets").await.unwrap();
        handle
            .add_all(vec!["http://x/a".to_string()])
            .await
            .unwrap();
        drop(handle);

        let reopened = store.open("assets").await.unwrap();
        let entry = reopened.match_url("http://x/a").await.unwrap().unwrap();
        assert_eq!(entry.url, "http://x/a");
        assert_eq!(reopened.keys().await.unwrap(), vec!["http://x/a"]);
    }

    #[tokio::test]
    async fn test_namespaces_listed_by_name() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store(&dir);

        store.open("beta").await.unwrap();
        store.open("alpha").await.unwrap();

        assert_eq!(store.namespaces().await.unwrap(), vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let (fetcher, store) = store(&dir);
        fetcher.fail("http://x/b");

        let handle = store.open("assets").await.unwrap();
        let result = handle
            .add_all(vec!["http://x/a".to_string(), "http://x/b".to_string()])
            .await;

        assert!(result.is_err());
        assert!(handle.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_entry() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store(&dir);
        let handle = store.open("assets").await.unwrap();

        handle
            .put(CachedResponse::new("http://x/a", 200, Vec::new(), vec![7]))
            .await
            .unwrap();
        assert!(handle.delete("http://x/a").await.unwrap());
        assert!(!handle.delete("http://x/a").await.unwrap());
        assert!(handle.match_url("http://x/a").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_of_same_url() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store(&dir);
        let handle = store.open("assets").await.unwrap();

        let writers: Vec<_> = (0..16u8)
            .map(|i| {
                let handle = Arc::clone(&handle);
                tokio::spawn(async move {
                    handle
                        .put(CachedResponse::new("http://x/a", 200, Vec::new(), vec![i; 4096]))
                        .await
                })
            })
            .collect();

        for writer in futures::future::join_all(writers).await {
            assert!(writer.unwrap().is_ok());
        }

        let entry = handle.match_url("http://x/a").await.unwrap().unwrap();
        assert_eq!(entry.body.len(), 4096);
        assert_eq!(handle.keys().await.unwrap(), vec!["http://x/a"]);

        let mut names = std::fs::read_dir(store.namespace_dir("assets")).unwrap();
        assert!(names.all(|e| e.unwrap().path().extension().and_then(|x| x.to_str()) != Some("tmp")));
    }

    #[tokio::test]
    async fn test_keys_do_not_decode_entries() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store(&dir);
        let handle = store.open("assets").await.unwrap();
        handle
            .put(CachedResponse::new("http://x/a", 200, Vec::new(), vec![1, 2, 3]))
            .await
            .unwrap();

        let entry_file = store
            .namespace_dir("assets")
            .join(format!("{}.entry", hex_digest("http://x/a")));
        std::fs::write(&entry_file, b"not bincode").unwrap();

        assert_eq!(handle.keys().await.unwrap(), vec!["http://x/a"]);
        assert!(matches!(
            handle.match_url("http://x/a").await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_keys_fall_back_to_entry_without_sidecar() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store(&dir);
        let handle = store.open("assets").await.unwrap();
        handle
            .put(CachedResponse::new("http://x/a", 200, Vec::new(), Vec::new()))
            .await
            .unwrap();

        let sidecar = store
            .namespace_dir("assets")
            .join(format!("{}.url", hex_digest("http://x/a")));
        std::fs::remove_file(sidecar).unwrap();

        assert_eq!(handle.keys().await.unwrap(), vec!["http://x/a"]);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_batch() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store(&dir);
        let handle = store.open("assets").await.unwrap();

        // A directory where the entry file should go makes the rename fail.
        let blocked = store
            .namespace_dir("assets")
            .join(format!("{}.entry", hex_digest("http://x/b")));
        std::fs::create_dir(&blocked).unwrap();

        let result = handle
            .add_all(vec!["http://x/a".to_string(), "http://x/b".to_string()])
            .await;

        assert!(result.is_err());
        assert!(handle.match_url("http://x/a").await.unwrap().is_none());
        assert!(handle.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_sidecar() {
        let dir = TempDir::new().unwrap();
        let (_, store) = store(&dir);
        let handle = store.open("assets").await.unwrap();
        handle
            .put(CachedResponse::new("http://x/a", 200, Vec::new(), Vec::new()))
            .await
            .unwrap();

        assert!(handle.delete("http://x/a").await.unwrap());

        let sidecar = store
            .namespace_dir("assets")
            .join(format!("{}.url", hex_digest("http://x/a")));
        assert!(!sidecar.exists());
        assert!(handle.keys().await.unwrap().is_empty());
    }
}
