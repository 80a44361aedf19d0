//! Result types returned by coordinator operations.

use std::fmt;

use serde::Serialize;

use crate::cache::CachedResponse;

/// Validation state of one URL in one box.
///
/// Computed per call, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ValidationStatus {
    /// The box does not exist or does not list the URL.
    NotCached = 0,
    /// The box lists the URL but the store has no entry for it.
    Invalid = 1,
    /// The box lists the URL and the store has it.
    Valid = 2,
}

impl ValidationStatus {
    /// Numeric code: 0, 1 or 2.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValidationStatus::NotCached => "NOT_CACHED",
            ValidationStatus::Invalid => "INVALID",
            ValidationStatus::Valid => "VALID",
        };
        f.write_str(label)
    }
}

/// A canonical URL and the entry the store returned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLookup {
    pub url: String,
    pub entry: Option<CachedResponse>,
}

impl CacheLookup {
    pub fn is_cached(&self) -> bool {
        self.entry.is_some()
    }
}

/// Outcome of removing one URL during a purge.
///
/// `removed` reports a physical store deletion, not the ledger update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalOutcome {
    pub url: String,
    pub removed: bool,
}

/// Validation result for one URL of a box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlStatus {
    pub url: String,
    pub status: ValidationStatus,
}

/// Summary of one heal pass over a box.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealReport {
    pub box_name: String,
    /// URLs validated.
    pub checked: usize,
    /// URLs found `INVALID` and submitted for re-fetch.
    pub invalid: Vec<String>,
    /// Whether the re-fetch batch succeeded.
    pub repaired: bool,
}

impl fmt::Display for HealReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.invalid.is_empty() {
            return write!(f, "{}: {} checked, nothing to heal", self.box_name, self.checked);
        }
        write!(
            f,
            "{}: {} checked, {} invalid, {}",
            self.box_name,
            self.checked,
            self.invalid.len(),
            if self.repaired { "repaired" } else { "repair failed" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ValidationStatus::NotCached.code(), 0);
        assert_eq!(ValidationStatus::Invalid.code(), 1);
        assert_eq!(ValidationStatus::Valid.code(), 2);
    }

    #[test]
    fn test_status_display_matches_serialization() {
        for status in [
            ValidationStatus::NotCached,
            ValidationStatus::Invalid,
            ValidationStatus::Valid,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.to_string()));
        }
    }

    #[test]
    fn test_heal_report_display() {
        let report = HealReport {
            box_name: "p".to_string(),
            checked: 3,
            invalid: vec!["http://x/a".to_string()],
            repaired: true,
        };
        assert_eq!(report.to_string(), "p: 3 checked, 1 invalid, repaired");
    }
}
