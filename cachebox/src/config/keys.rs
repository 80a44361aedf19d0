//! Addressable configuration keys (`section.key`).

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use super::file::{ConfigFile, StoreBackend};

/// Errors from parsing or setting a configuration key.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// A single configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    StoreBackend,
    StoreDirectory,
    LedgerPath,
    LedgerRegistryKey,
    LedgerDefaultBox,
    FetchBaseUrl,
    FetchTimeoutSecs,
    LoggingLevel,
    LoggingFile,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::StoreBackend,
            ConfigKey::StoreDirectory,
            ConfigKey::LedgerPath,
            ConfigKey::LedgerRegistryKey,
            ConfigKey::LedgerDefaultBox,
            ConfigKey::FetchBaseUrl,
            ConfigKey::FetchTimeoutSecs,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingFile,
        ]
    }

    /// The `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::StoreBackend => "store.backend",
            ConfigKey::StoreDirectory => "store.directory",
            ConfigKey::LedgerPath => "ledger.path",
            ConfigKey::LedgerRegistryKey => "ledger.registry_key",
            ConfigKey::LedgerDefaultBox => "ledger.default_box",
            ConfigKey::FetchBaseUrl => "fetch.base_url",
            ConfigKey::FetchTimeoutSecs => "fetch.timeout_secs",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// The INI section, e.g. `store`.
    pub fn section(&self) -> &'static str {
        self.split().0
    }

    /// The key within its section, e.g. `backend`.
    pub fn key_name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        let name = self.name();
        name.split_once('.').unwrap_or(("", name))
    }

    /// Current value as a string; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::StoreBackend => config.store.backend.to_string(),
            ConfigKey::StoreDirectory => config.store.directory.display().to_string(),
            ConfigKey::LedgerPath => config.ledger.path.display().to_string(),
            ConfigKey::LedgerRegistryKey => config.ledger.registry_key.clone(),
            ConfigKey::LedgerDefaultBox => config.ledger.default_box.clone(),
            ConfigKey::FetchBaseUrl => config.fetch.base_url.clone().unwrap_or_default(),
            ConfigKey::FetchTimeoutSecs => config.fetch.timeout_secs.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate and apply `value`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let value = value.trim();
        let invalid = |reason: String| ConfigKeyError::InvalidValue {
            key: self.name(),
            reason,
        };
        let required = || {
            if value.is_empty() {
                Err(invalid("value must not be empty".to_string()))
            } else {
                Ok(value.to_string())
            }
        };

        match self {
            ConfigKey::StoreBackend => {
                config.store.backend = value.parse::<StoreBackend>().map_err(invalid)?;
            }
            ConfigKey::StoreDirectory => config.store.directory = PathBuf::from(required()?),
            ConfigKey::LedgerPath => config.ledger.path = PathBuf::from(required()?),
            ConfigKey::LedgerRegistryKey => config.ledger.registry_key = required()?,
            ConfigKey::LedgerDefaultBox => config.ledger.default_box = required()?,
            ConfigKey::FetchBaseUrl => {
                if !value.is_empty() && crate::url::UrlCanonicalizer::with_base(value).is_none() {
                    return Err(invalid(format!("'{}' is not an absolute URL", value)));
                }
                config.fetch.base_url = Some(value.to_string()).filter(|v| !v.is_empty());
            }
            ConfigKey::FetchTimeoutSecs => {
                let secs: u64 = value.parse().map_err(|e| invalid(format!("{}", e)))?;
                if secs == 0 {
                    return Err(invalid("timeout must be at least 1 second".to_string()));
                }
                config.fetch.timeout_secs = secs;
            }
            ConfigKey::LoggingLevel => config.logging.level = required()?,
            ConfigKey::LoggingFile => {
                config.logging.file = Some(value)
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from);
            }
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|k| k.name() == s.trim())
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
        assert!("store.nope".parse::<ConfigKey>().is_err());
    }

    #[test]
    fn test_section_and_key_name() {
        assert_eq!(ConfigKey::FetchBaseUrl.section(), "fetch");
        assert_eq!(ConfigKey::FetchBaseUrl.key_name(), "base_url");
        assert_eq!(ConfigKey::LedgerDefaultBox.section(), "ledger");
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();
        ConfigKey::StoreBackend.set(&mut config, "memory").unwrap();
        ConfigKey::FetchTimeoutSecs.set(&mut config, "12").unwrap();
        ConfigKey::FetchBaseUrl
            .set(&mut config, "https://app.example/")
            .unwrap();

        assert_eq!(ConfigKey::StoreBackend.get(&config), "memory");
        assert_eq!(ConfigKey::FetchTimeoutSecs.get(&config), "12");
        assert_eq!(ConfigKey::FetchBaseUrl.get(&config), "https://app.example/");

        ConfigKey::FetchBaseUrl.set(&mut config, "").unwrap();
        assert_eq!(config.fetch.base_url, None);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::StoreBackend.set(&mut config, "cloud").is_err());
        assert!(ConfigKey::FetchTimeoutSecs.set(&mut config, "0").is_err());
        assert!(ConfigKey::FetchTimeoutSecs.set(&mut config, "soon").is_err());
        assert!(ConfigKey::FetchBaseUrl.set(&mut config, "relative/path").is_err());
        assert!(ConfigKey::LedgerDefaultBox.set(&mut config, "  ").is_err());
        assert_eq!(config, ConfigFile::default());
    }
}
