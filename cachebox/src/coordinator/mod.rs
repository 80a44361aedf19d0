//! Box/cache consistency engine.
//!
//! The `CacheCoordinator` keeps two independently mutable stores in step:
//! the ledger (which URLs each box claims, and which namespace it is bound
//! to) and the content store (what is physically cached per namespace).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       CacheCoordinator                          │
//! │                                                                 │
//! │  add / remove / purge ──► BoxRegistry ──► Arc<dyn Ledger>       │
//! │          │                     ▲                                │
//! │          ▼                     │ scan                           │
//! │  Arc<dyn ContentStore> ◄── Reconciler (tidy)                    │
//! │          ▲                                                      │
//! │  validate / heal ───────────────┘                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Failure Policy
//!
//! - Namespace mismatches and ledger failures are returned to the caller.
//! - Content store failures are logged and treated as "did not happen";
//!   the ledger keeps the intent and [`CacheCoordinator::heal_by_box`]
//!   repairs the gap later.
//!
//! # Unsupported Environments
//!
//! A coordinator built without a content store (see
//! [`CacheCoordinator::unsupported`]) answers every operation with an empty
//! result, `false` or `NOT_CACHED`, and leaves the ledger untouched.

mod error;
mod reconciler;
mod types;


pub use error::CoordinatorError;
pub use reconciler::{Reconciler, TidyReport};
pub use types::{CacheLookup, HealReport, RemovalOutcome, UrlStatus, ValidationStatus};

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::boxes::{BoxRecord, BoxRegistry, DEFAULT_BOX_NAME};
use crate::cache::{CachedResponse, ContentStore, StoreHandle};
use crate::url::Canonicalize;

/// Open `cache_name`, logging and swallowing failure.
pub(crate) async fn open_namespace(
    store: &dyn ContentStore,
    cache_name: &str,
) -> Option<Arc<dyn StoreHandle>> {
    match store.open(cache_name).await {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(cache_name, error = %e, "Failed to open content store");
            None
        }
    }
}

/// Look up `url`, treating a failed lookup as absent.
async fn lookup(handle: Option<&Arc<dyn StoreHandle>>, url: &str) -> Option<CachedResponse> {
    let handle = handle?;
    match handle.match_url(url).await {
        Ok(entry) => entry,
        Err(e) => {
            warn!(cache_name = handle.namespace(), url, error = %e, "Cache lookup failed");
            None
        }
    }
}

/// Probe the store for a URL the box claims.
///
/// Anything short of a matching entry is `INVALID`.
async fn probe(handle: Option<&Arc<dyn StoreHandle>>, url: &str) -> ValidationStatus {
    if lookup(handle, url).await.is_some() {
        ValidationStatus::Valid
    } else {
        ValidationStatus::Invalid
    }
}

/// Heal result for one box, keyed by box name.
pub type BoxHealOutcome = (String, Result<HealReport, CoordinatorError>);

/// Public API over boxes, the ledger and the content store.
#[derive(Clone)]
pub struct CacheCoordinator {
    registry: BoxRegistry,
    store: Option<Arc<dyn ContentStore>>,
    canonicalizer: Arc<dyn Canonicalize>,
    reconciler: Reconciler,
    default_box: String,
}

impl CacheCoordinator {
    /// Create a coordinator over `registry` and `store`.
    ///
    /// The registry should already be initialized (see [`BoxRegistry::init`]).
    pub fn new(
        registry: BoxRegistry,
        store: Arc<dyn ContentStore>,
        canonicalizer: Arc<dyn Canonicalize>,
    ) -> Self {
        Self::build(registry, Some(store), canonicalizer)
    }

    /// Create a coordinator for a host with no content store.
    ///
    /// Every operation degrades to an empty result without touching the
    /// ledger.
    pub fn unsupported(registry: BoxRegistry, canonicalizer: Arc<dyn Canonicalize>) -> Self {
        Self::build(registry, None, canonicalizer)
    }

    fn build(
        registry: BoxRegistry,
        store: Option<Arc<dyn ContentStore>>,
        canonicalizer: Arc<dyn Canonicalize>,
    ) -> Self {
        let reconciler = Reconciler::new(registry.clone(), store.clone());
        Self {
            registry,
            store,
            canonicalizer,
            reconciler,
            default_box: DEFAULT_BOX_NAME.to_string(),
        }
    }

    /// Use `name` for calls that pass an empty box name.
    pub fn with_default_box(mut self, name: impl Into<String>) -> Self {
        self.default_box = name.into();
        self
    }

    /// Whether a content store is available.
    pub fn is_supported(&self) -> bool {
        self.store.is_some()
    }

    pub fn default_box(&self) -> &str {
        &self.default_box
    }

    pub fn registry(&self) -> &BoxRegistry {
        &self.registry
    }

    /// Canonical form of `url`, as stored in boxes and store keys.
    pub fn canonicalize(&self, url: &str) -> String {
        self.canonicalizer.canonicalize(url)
    }

    fn resolve_box_name<'a>(&'a self, box_name: &'a str) -> &'a str {
        if box_name.is_empty() {
            &self.default_box
        } else {
            box_name
        }
    }

    async fn open(&self, cache_name: &str) -> Option<Arc<dyn StoreHandle>> {
        let store = self.store.as_ref()?;
        open_namespace(store.as_ref(), cache_name).await
    }

    /// Add `urls` to `box_name`, binding the box to `cache_name` on first
    /// use, and cache whatever is not cached yet.
    ///
    /// The box record is written before the store is touched; fetch
    /// failures are logged and left for [`heal_by_box`](Self::heal_by_box).
    ///
    /// # Returns
    ///
    /// One lookup per input URL, in input order, after the add.
    ///
    /// # Errors
    ///
    /// `NamespaceMismatch` if the box is bound to another namespace; the
    /// box is left unchanged.
    pub async fn add_to_box<S: AsRef<str>>(
        &self,
        box_name: &str,
        cache_name: &str,
        urls: &[S],
    ) -> Result<Vec<CacheLookup>, CoordinatorError> {
        if !self.is_supported() {
            return Ok(Vec::new());
        }
        if cache_name.is_empty() {
            return Err(CoordinatorError::EmptyCacheName);
        }
        let box_name = self.resolve_box_name(box_name);
        let urls: Vec<String> = urls.iter().map(|u| self.canonicalize(u.as_ref())).collect();
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        self.registry.register(box_name)?;

        let mut record = BoxRecord::load_or_default(self.registry.load_box(box_name)?);
        if record.conflicts_with(cache_name) {
            return Err(CoordinatorError::mismatch(
                box_name,
                &record.cache_name,
                cache_name,
            ));
        }
        record.cache_name = cache_name.to_string();
        let added = record.insert_all(urls.iter().map(String::as_str));
        self.registry.save_box(box_name, &record)?;
        debug!(box_name, cache_name, added, total = record.urls.len(), "Saved box");

        let handle = self.open(cache_name).await;
        if let Some(handle) = &handle {
            let present: HashSet<String> = match handle.keys().await {
                Ok(keys) => keys.into_iter().collect(),
                Err(e) => {
                    warn!(cache_name, error = %e, "Failed to enumerate store, fetching everything");
                    HashSet::new()
                }
            };

            let mut missing: Vec<String> = Vec::new();
            for url in &urls {
                if !present.contains(url) && !missing.contains(url) {
                    missing.push(url.clone());
                }
            }

            if !missing.is_empty() {
                let count = missing.len();
                match handle.add_all(missing).await {
                    Ok(()) => debug!(box_name, cache_name, count, "Cached new URLs"),
                    Err(e) => warn!(
                        box_name,
                        cache_name,
                        count,
                        error = %e,
                        "Failed to cache URLs; heal will retry"
                    ),
                }
            }
        }

        if let Err(e) = self.reconciler.tidy(cache_name).await {
            warn!(cache_name, error = %e, "Tidy after add failed");
        }

        let mut lookups = Vec::with_capacity(urls.len());
        for url in urls {
            let entry = lookup(handle.as_ref(), &url).await;
            lookups.push(CacheLookup { url, entry });
        }

        info!(
            box_name,
            cache_name,
            requested = lookups.len(),
            cached = lookups.iter().filter(|l| l.is_cached()).count(),
            "Added to box"
        );
        Ok(lookups)
    }

    /// The cached entry for `url`, if `box_name` claims it and the store
    /// has it.
    pub async fn get_from_cache(
        &self,
        box_name: &str,
        url: &str,
    ) -> Result<Option<CachedResponse>, CoordinatorError> {
        if !self.is_supported() {
            return Ok(None);
        }
        let box_name = self.resolve_box_name(box_name);
        let url = self.canonicalize(url);

        let Some(record) = self.registry.load_box(box_name)? else {
            return Ok(None);
        };
        if !record.contains(&url) {
            return Ok(None);
        }

        let handle = self.open(&record.cache_name).await;
        Ok(lookup(handle.as_ref(), &url).await)
    }

    /// Every URL of `box_name` with its cached entry, in box order.
    pub async fn get_all_in_box(
        &self,
        box_name: &str,
    ) -> Result<Vec<CacheLookup>, CoordinatorError> {
        if !self.is_supported() {
            return Ok(Vec::new());
        }
        let box_name = self.resolve_box_name(box_name);
        let Some(record) = self.registry.load_box(box_name)? else {
            return Ok(Vec::new());
        };

        let handle = self.open(&record.cache_name).await;
        let mut lookups = Vec::with_capacity(record.urls.len());
        for url in record.urls {
            let entry = lookup(handle.as_ref(), &url).await;
            lookups.push(CacheLookup { url, entry });
        }
        Ok(lookups)
    }

    /// The namespace `box_name` is bound to, if the box exists.
    pub fn get_cache_name_for_box(
        &self,
        box_name: &str,
    ) -> Result<Option<String>, CoordinatorError> {
        if !self.is_supported() {
            return Ok(None);
        }
        let box_name = self.resolve_box_name(box_name);
        Ok(self
            .registry
            .load_box(box_name)?
            .filter(BoxRecord::is_bound)
            .map(|record| record.cache_name))
    }

    /// Registered box names in registration order.
    pub fn list_boxes(&self) -> Result<Vec<String>, CoordinatorError> {
        if !self.is_supported() {
            return Ok(Vec::new());
        }
        Ok(self.registry.list_all()?)
    }

    /// Remove `url` from `box_name`, deleting it from the store only if no
    /// other box still lists it.
    ///
    /// # Returns
    ///
    /// `true` only if a store entry was physically deleted. `false` when the
    /// box does not exist, another box still references the URL, or the
    /// store had nothing to delete.
    ///
    /// # Errors
    ///
    /// `NamespaceMismatch` if the box is bound to another namespace.
    pub async fn remove_from_box(
        &self,
        box_name: &str,
        cache_name: &str,
        url: &str,
    ) -> Result<bool, CoordinatorError> {
        if !self.is_supported() {
            return Ok(false);
        }
        let box_name = self.resolve_box_name(box_name);
        let url = self.canonicalize(url);

        let Some(mut record) = self.registry.load_box(box_name)? else {
            return Ok(false);
        };
        if record.conflicts_with(cache_name) {
            return Err(CoordinatorError::mismatch(
                box_name,
                &record.cache_name,
                cache_name,
            ));
        }

        if record.remove(&url) {
            self.registry.save_box(box_name, &record)?;
        }

        if let Some(holder) = self.find_other_holder(box_name, &url)? {
            debug!(box_name, url = %url, holder = %holder, "URL still referenced, keeping entry");
            return Ok(false);
        }

        let Some(handle) = self.open(cache_name).await else {
            return Ok(false);
        };
        match handle.delete(&url).await {
            Ok(removed) => {
                debug!(box_name, cache_name, url = %url, removed, "Removed from box");
                Ok(removed)
            }
            Err(e) => {
                warn!(cache_name, url = %url, error = %e, "Failed to delete cache entry");
                Ok(false)
            }
        }
    }

    /// First registered box other than `box_name` that lists `url`.
    fn find_other_holder(
        &self,
        box_name: &str,
        url: &str,
    ) -> Result<Option<String>, CoordinatorError> {
        Ok(self
            .registry
            .load_all()?
            .into_iter()
            .find(|(name, record)| name != box_name && record.contains(url))
            .map(|(name, _)| name))
    }

    /// Remove every URL of `box_name`, then unregister it.
    ///
    /// URLs are removed in box order. The box is unregistered whatever the
    /// individual outcomes were.
    pub async fn remove_by_box(
        &self,
        box_name: &str,
    ) -> Result<Vec<RemovalOutcome>, CoordinatorError> {
        if !self.is_supported() {
            return Ok(Vec::new());
        }
        let box_name = self.resolve_box_name(box_name);
        let Some(record) = self.registry.load_box(box_name)? else {
            return Ok(Vec::new());
        };

        let mut outcomes = Vec::with_capacity(record.urls.len());
        for url in &record.urls {
            let removed = self
                .remove_from_box(box_name, &record.cache_name, url)
                .await?;
            outcomes.push(RemovalOutcome {
                url: url.clone(),
                removed,
            });
        }

        self.registry.unregister(box_name)?;
        info!(
            box_name,
            urls = outcomes.len(),
            deleted = outcomes.iter().filter(|o| o.removed).count(),
            "Purged box"
        );
        Ok(outcomes)
    }

    /// Validation state of `url` in `box_name`.
    ///
    /// # Errors
    ///
    /// `NamespaceMismatch` if the box is bound to another namespace.
    pub async fn validate(
        &self,
        box_name: &str,
        cache_name: &str,
        url: &str,
    ) -> Result<ValidationStatus, CoordinatorError> {
        if !self.is_supported() {
            return Ok(ValidationStatus::NotCached);
        }
        let box_name = self.resolve_box_name(box_name);
        let url = self.canonicalize(url);

        let Some(record) = self.registry.load_box(box_name)? else {
            return Ok(ValidationStatus::NotCached);
        };
        if record.conflicts_with(cache_name) {
            return Err(CoordinatorError::mismatch(
                box_name,
                &record.cache_name,
                cache_name,
            ));
        }
        if !record.contains(&url) {
            return Ok(ValidationStatus::NotCached);
        }

        let handle = self.open(&record.cache_name).await;
        Ok(probe(handle.as_ref(), &url).await)
    }

    /// Validation state of every URL in `box_name`, in box order.
    pub async fn validate_by_box(
        &self,
        box_name: &str,
    ) -> Result<Vec<UrlStatus>, CoordinatorError> {
        if !self.is_supported() {
            return Ok(Vec::new());
        }
        let box_name = self.resolve_box_name(box_name);
        let Some(record) = self.registry.load_box(box_name)? else {
            return Ok(Vec::new());
        };

        let handle = self.open(&record.cache_name).await;
        let mut statuses = Vec::with_capacity(record.urls.len());
        for url in record.urls {
            let status = probe(handle.as_ref(), &url).await;
            statuses.push(UrlStatus { url, status });
        }
        Ok(statuses)
    }

    /// Prune entries of `cache_name` that no box references.
    pub async fn tidy(&self, cache_name: &str) -> Result<TidyReport, CoordinatorError> {
        Ok(self.reconciler.tidy(cache_name).await?)
    }

    /// Tidy every namespace the store holds, including namespaces no box is
    /// bound to anymore.
    ///
    /// Namespaces are tidied one at a time in the store's listing order.
    pub async fn tidy_all(&self) -> Result<Vec<(String, TidyReport)>, CoordinatorError> {
        let Some(store) = &self.store else {
            return Ok(Vec::new());
        };
        let namespaces = match store.namespaces().await {
            Ok(namespaces) => namespaces,
            Err(e) => {
                warn!(error = %e, "Failed to list store namespaces");
                return Ok(Vec::new());
            }
        };

        let mut reports = Vec::with_capacity(namespaces.len());
        for cache_name in namespaces {
            let report = self.reconciler.tidy(&cache_name).await?;
            reports.push((cache_name, report));
        }
        Ok(reports)
    }

    /// Re-fetch every URL of `box_name` whose status is `INVALID`.
    ///
    /// Tidies the namespace first. A failed re-fetch is logged and reported
    /// through [`HealReport::repaired`]; the next heal retries it.
    pub async fn heal_by_box(&self, box_name: &str) -> Result<HealReport, CoordinatorError> {
        let box_name = self.resolve_box_name(box_name);
        let mut report = HealReport {
            box_name: box_name.to_string(),
            ..HealReport::default()
        };
        if !self.is_supported() {
            return Ok(report);
        }

        let Some(record) = self.registry.load_box(box_name)? else {
            return Ok(report);
        };

        self.reconciler.tidy(&record.cache_name).await?;

        let statuses = self.validate_by_box(box_name).await?;
        report.checked = statuses.len();
        report.invalid = statuses
            .into_iter()
            .filter(|s| s.status == ValidationStatus::Invalid)
            .map(|s| s.url)
            .collect();

        if report.invalid.is_empty() {
            debug!(box_name, checked = report.checked, "Nothing to heal");
            return Ok(report);
        }

        let Some(handle) = self.open(&record.cache_name).await else {
            return Ok(report);
        };
        match handle.add_all(report.invalid.clone()).await {
            Ok(()) => {
                report.repaired = true;
                info!(box_name, healed = report.invalid.len(), "Healed box");
            }
            Err(e) => warn!(
                box_name,
                invalid = report.invalid.len(),
                error = %e,
                "Heal failed; will retry on next pass"
            ),
        }
        Ok(report)
    }

    /// Heal every registered box concurrently.
    ///
    /// Boxes are independent: one failing does not stop the others. Each
    /// outcome is returned alongside its box name.
    pub async fn heal_all(&self) -> Result<Vec<BoxHealOutcome>, CoordinatorError> {
        if !self.is_supported() {
            return Ok(Vec::new());
        }

        let names = self.registry.list_all()?;
        let heals = names.into_iter().map(|name| async move {
            let result = self.heal_by_box(&name).await;
            if let Err(e) = &result {
                warn!(box_name = %name, error = %e, "Failed to heal box");
            }
            (name, result)
        });

        Ok(join_all(heals).await)
    }
}
