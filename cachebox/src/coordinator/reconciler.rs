//! Namespace reconciliation ("tidy").
//!
//! Computes the union of URLs claimed by every box bound to a namespace and
//! deletes whatever else the store holds for it. Membership is established
//! by scanning box records, never by a counter, so there is nothing that can
//! drift out of step with the records themselves.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::open_namespace;
use crate::boxes::BoxRegistry;
use crate::cache::{ContentStore, StoreHandle};
use crate::ledger::LedgerError;

/// Summary of one tidy pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TidyReport {
    /// Keys present in the store and claimed by some box.
    pub kept: usize,
    /// Orphaned keys deleted.
    pub deleted: usize,
    /// Orphaned keys whose deletion failed; retried by the next pass.
    pub failed: usize,
}

impl fmt::Display for TidyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "kept {}, deleted {}, failed {}",
            self.kept, self.deleted, self.failed
        )
    }
}

/// Prunes store entries no longer referenced by any box of their namespace.
#[derive(Clone)]
pub struct Reconciler {
    registry: BoxRegistry,
    store: Option<Arc<dyn ContentStore>>,
}

impl Reconciler {
    pub fn new(registry: BoxRegistry, store: Option<Arc<dyn ContentStore>>) -> Self {
        Self { registry, store }
    }

    /// URLs claimed by any registered box bound to `cache_name`.
    pub fn referenced_urls(&self, cache_name: &str) -> Result<HashSet<String>, LedgerError> {
        Ok(self
            .registry
            .boxes_in_namespace(cache_name)?
            .into_iter()
            .flat_map(|(_, record)| record.urls)
            .collect())
    }

    /// Delete every key in `cache_name` that no box references.
    ///
    /// Store failures are logged and counted, never raised. A ledger failure
    /// aborts the pass before anything is deleted.
    pub async fn tidy(&self, cache_name: &str) -> Result<TidyReport, LedgerError> {
        let Some(store) = &self.store else {
            return Ok(TidyReport::default());
        };

        let referenced = self.referenced_urls(cache_name)?;

        let Some(handle) = open_namespace(store.as_ref(), cache_name).await else {
            return Ok(TidyReport::default());
        };

        let present = match handle.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(cache_name, error = %e, "Tidy could not enumerate store");
                return Ok(TidyReport::default());
            }
        };

        let (kept, orphans): (Vec<String>, Vec<String>) = present
            .into_iter()
            .partition(|url| referenced.contains(url));

        let mut report = TidyReport {
            kept: kept.len(),
            ..TidyReport::default()
        };

        if orphans.is_empty() {
            debug!(cache_name, kept = report.kept, "Tidy found no orphans");
            return Ok(report);
        }

        let deletions = orphans.iter().map(|url| {
            let handle = Arc::clone(&handle);
            async move { (url, handle.delete(url).await) }
        });

        for (url, result) in join_all(deletions).await {
            match result {
                Ok(_) => report.deleted += 1,
                Err(e) => {
                    warn!(cache_name, url = %url, error = %e, "Failed to delete orphaned entry");
                    report.failed += 1;
                }
            }
        }

        info!(cache_name, %report, "Tidied namespace");
        Ok(report)
    }
}
