//! Content store provider implementations.
//!
//! Each provider implements [`ContentStore`](crate::cache::ContentStore) and
//! hands out per-namespace [`StoreHandle`](crate::cache::StoreHandle)s.
//!
//! # Available Providers
//!
//! - [`MemoryContentStore`]: process-local maps, one per namespace
//! - [`DiskContentStore`]: one directory per namespace, one file per entry

mod disk;
mod memory;

pub use disk::DiskContentStore;
pub use memory::MemoryContentStore;

use futures::future::join_all;

use crate::cache::entry::CachedResponse;
use crate::cache::fetch::Fetcher;
use crate::cache::traits::{collect_batch, StoreError};

/// Fetch every URL concurrently, failing the whole batch on any failure.
pub(crate) async fn fetch_batch(
    fetcher: &dyn Fetcher,
    urls: &[String],
) -> Result<Vec<CachedResponse>, StoreError> {
    let results = join_all(urls.iter().map(|url| fetcher.fetch(url))).await;
    collect_batch(results)
}
