//! Network fetch abstraction for testability.

use std::time::Duration;

use super::entry::CachedResponse;
use super::traits::{BoxFuture, StoreError};

/// Default request timeout for [`HttpFetcher`].
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Trait for retrieving a URL as a storable response.
///
/// This abstraction lets store handles implement `add_all` without knowing
/// about the network, and lets tests substitute deterministic fetchers.
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, failing on transport errors and non-success statuses.
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<CachedResponse, StoreError>>;
}

/// HTTP fetcher using reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a new HttpFetcher with the default timeout.
    pub fn new() -> Result<Self, StoreError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT_SECS)
    }

    /// Creates a new HttpFetcher with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Fetch {
                url: String::new(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<CachedResponse, StoreError>> {
        let url = url.to_string();
        Box::pin(async move {
            let fail = |reason: String| StoreError::Fetch {
                url: url.clone(),
                reason,
            };

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| fail(format!("Request failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                return Err(fail(format!("HTTP {}", status)));
            }

            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();

            let body = response
                .bytes()
                .await
                .map_err(|e| fail(format!("Failed to read response: {}", e)))?;

            Ok(CachedResponse::new(
                url.clone(),
                status.as_u16(),
                headers,
                body.to_vec(),
            ))
        })
    }
}
