//! Cached response payloads.

use serde::{Deserialize, Serialize};

/// A response stored in the content store.
///
/// The payload is opaque to the coordinator; only `url` is interpreted, as
/// the key the entry is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Canonical URL this response was fetched from.
    pub url: String,

    /// HTTP status code.
    pub status: u16,

    /// Response headers in received order.
    pub headers: Vec<(String, String)>,

    /// Response body.
    pub body: Vec<u8>,

    /// When the entry was stored (secs since UNIX_EPOCH).
    pub stored_at_secs: i64,
}

impl CachedResponse {
    /// Create a response stamped with the current time.
    pub fn new(
        url: impl Into<String>,
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body,
            stored_at_secs: chrono::Utc::now().timestamp(),
        }
    }

    /// Look up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body length in bytes.
    pub fn size_bytes(&self) -> usize {
        self.body.len()
    }
}
