//! Content store: responses cached per namespace, keyed by canonical URL.
//!
//! The coordinator only ever talks to `Arc<dyn ContentStore>`; providers are
//! picked at bootstrap.
//!
//! ```text
//! ┌──────────────────────┐   open(ns)   ┌──────────────────────────┐
//! │  Arc<dyn ContentStore>│ ───────────► │  Arc<dyn StoreHandle>    │
//! │                      │              │  keys / match / add_all  │
//! │  Memory | Disk       │              │  put / delete            │
//! └──────────────────────┘              └────────────┬─────────────┘
//!                                                    │ add_all
//!                                                    ▼
//!                                       ┌──────────────────────────┐
//!                                       │  Arc<dyn Fetcher>        │
//!                                       └──────────────────────────┘
//! ```

mod entry;
mod fetch;
mod providers;
mod traits;

pub use entry::CachedResponse;
pub use fetch::{Fetcher, HttpFetcher, DEFAULT_FETCH_TIMEOUT_SECS};
pub use providers::{DiskContentStore, MemoryContentStore};
pub use traits::{BoxFuture, ContentStore, StoreError, StoreHandle};

#[cfg(test)]
pub(crate) use fetch::tests::MockFetcher;
