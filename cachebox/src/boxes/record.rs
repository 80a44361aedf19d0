//! Durable per-box record.

use serde::{Deserialize, Serialize};

/// Ledger key prefix for box records.
const BOX_KEY_PREFIX: &str = "box:";

/// Ledger key for the record of `box_name`.
///
/// Format: `box:{name}`
pub fn box_key(box_name: &str) -> String {
    format!("{}{}", BOX_KEY_PREFIX, box_name)
}

/// A box: the namespace it is bound to and the URLs it claims.
///
/// `urls` has set semantics with list representation: insertion order is
/// kept and a URL never appears twice. An empty `cache_name` means the box
/// has not been bound yet (the state of a box that was never written).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxRecord {
    pub cache_name: String,
    pub urls: Vec<String>,
}

impl BoxRecord {
    /// A fresh record bound to `cache_name`.
    pub fn new(cache_name: impl Into<String>) -> Self {
        Self {
            cache_name: cache_name.into(),
            urls: Vec::new(),
        }
    }

    /// The record to use for a box that may not exist yet.
    ///
    /// Pure: absence becomes an unbound, empty record; nothing is written.
    pub fn load_or_default(existing: Option<BoxRecord>) -> Self {
        existing.unwrap_or_default()
    }

    pub fn is_bound(&self) -> bool {
        !self.cache_name.is_empty()
    }

    /// Whether this record is bound to a namespace other than `cache_name`.
    pub fn conflicts_with(&self, cache_name: &str) -> bool {
        self.is_bound() && self.cache_name != cache_name
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    /// Append every URL not already present, in input order.
    ///
    /// # Returns
    ///
    /// The number of URLs actually added.
    pub fn insert_all<'a>(&mut self, urls: impl IntoIterator<Item = &'a str>) -> usize {
        let mut added = 0;
        for url in urls {
            if !self.contains(url) {
                self.urls.push(url.to_string());
                added += 1;
            }
        }
        added
    }

    /// Remove `url`, returning whether it was present.
    pub fn remove(&mut self, url: &str) -> bool {
        let before = self.urls.len();
        self.urls.retain(|u| u != url);
        self.urls.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_key() {
        assert_eq!(box_key("precache"), "box:precache");
    }

    #[test]
    fn test_load_or_default_is_unbound() {
        let record = BoxRecord::load_or_default(None);
        assert!(!record.is_bound());
        assert!(record.urls.is_empty());
        assert!(!record.conflicts_with("anything"));
    }

    #[test]
    fn test_insert_all_keeps_order_and_dedupes() {
        let mut record = BoxRecord::new("c");
        record.urls.push("http://x/b".to_string());

        let added = record.insert_all(["http://x/a", "http://x/b", "http://x/a", "http://x/c"]);

        assert_eq!(added, 2);
        assert_eq!(record.urls, vec!["http://x/b", "http://x/a", "http://x/c"]);
    }

    #[test]
    fn test_conflicts_only_when_bound_elsewhere() {
        let record = BoxRecord::new("cacheX");
        assert!(!record.conflicts_with("cacheX"));
        assert!(record.conflicts_with("cacheY"));
    }

    #[test]
    fn test_remove() {
        let mut record = BoxRecord::new("c");
        record.insert_all(["http://x/a", "http://x/b"]);
        assert!(record.remove("http://x/a"));
        assert!(!record.remove("http://x/a"));
        assert_eq!(record.urls, vec!["http://x/b"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut record = BoxRecord::new("c");
        record.insert_all(["http://x/a"]);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"cacheName": "c", "urls": ["http://x/a"]})
        );
    }
}
