//! URL canonicalization.
//!
//! Boxes and store keys always hold canonical URLs, so two spellings of the
//! same resource (`HTTP://Example.com:80/a/../b#top` and
//! `http://example.com/b`) collapse to one key.

use reqwest::Url;

/// Maps a caller-supplied URL to its canonical absolute form.
///
/// Implementations must be deterministic and idempotent:
/// `canonicalize(canonicalize(u)) == canonicalize(u)`.
pub trait Canonicalize: Send + Sync {
    fn canonicalize(&self, url: &str) -> String;
}

/// WHATWG URL canonicalizer with an optional base for relative input.
///
/// - scheme and host are lowercased, default ports dropped
/// - `.` and `..` path segments are resolved
/// - the fragment is removed
///
/// Input that cannot be parsed (or is relative with no base configured) is
/// returned trimmed but otherwise unchanged.
#[derive(Debug, Clone, Default)]
pub struct UrlCanonicalizer {
    base: Option<Url>,
}

impl UrlCanonicalizer {
    /// Canonicalizer that only accepts absolute URLs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalizer resolving relative URLs against `base`.
    ///
    /// Returns `None` if `base` is not an absolute URL.
    pub fn with_base(base: &str) -> Option<Self> {
        let base = Url::parse(base.trim()).ok()?;
        if base.cannot_be_a_base() {
            return None;
        }
        Some(Self { base: Some(base) })
    }

    /// The configured base URL, if any.
    pub fn base(&self) -> Option<&str> {
        self.base.as_ref().map(Url::as_str)
    }
}

impl Canonicalize for UrlCanonicalizer {
    fn canonicalize(&self, url: &str) -> String {
        let trimmed = url.trim();
        let parsed = match &self.base {
            Some(base) => base.join(trimmed),
            None => Url::parse(trimmed),
        };

        match parsed {
            Ok(mut parsed) => {
                parsed.set_fragment(None);
                parsed.into()
            }
            Err(_) => trimmed.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_absolute_urls_are_normalized() {
        let c = UrlCanonicalizer::new();
        assert_eq!(
            c.canonicalize("HTTP://Example.COM:80/a/../b#top"),
            "http://example.com/b"
        );
        assert_eq!(c.canonicalize("http://x/a"), "http://x/a");
        assert_eq!(c.canonicalize("  https://x/a?q=1  "), "https://x/a?q=1");
    }

    #[test]
    fn test_relative_urls_resolve_against_base() {
        let c = UrlCanonicalizer::with_base("https://app.example/static/").unwrap();
        assert_eq!(c.canonicalize("app.js"), "https://app.example/static/app.js");
        assert_eq!(c.canonicalize("/index.html"), "https://app.example/index.html");
        assert_eq!(c.canonicalize("http://other/x"), "http://other/x");
    }

    #[test]
    fn test_relative_without_base_is_left_alone() {
        let c = UrlCanonicalizer::new();
        assert_eq!(c.canonicalize(" app.js "), "app.js");
    }

    #[test]
    fn test_with_base_rejects_non_base_urls() {
        assert!(UrlCanonicalizer::with_base("not a url").is_none());
        assert!(UrlCanonicalizer::with_base("mailto:someone@example.com").is_none());
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(path in "[a-zA-Z0-9./_-]{0,24}", upper in any::<bool>()) {
            let c = UrlCanonicalizer::with_base("https://Example.com/root/").unwrap();
            let input = if upper { path.to_uppercase() } else { path };
            let once = c.canonicalize(&input);
            prop_assert_eq!(c.canonicalize(&once), once.clone());
        }
    }
}
