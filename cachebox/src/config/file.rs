//! Loading and saving `config.ini`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::boxes::{DEFAULT_BOX_NAME, DEFAULT_REGISTRY_KEY};
use crate::cache::DEFAULT_FETCH_TIMEOUT_SECS;

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

/// Which content store backs the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// One directory per namespace under `store.directory`.
    Disk,
    /// Process-local maps; nothing survives exit.
    Memory,
    /// No content store: every operation degrades to an empty result.
    None,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreBackend::Disk => "disk",
            StoreBackend::Memory => "memory",
            StoreBackend::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disk" => Ok(StoreBackend::Disk),
            "memory" => Ok(StoreBackend::Memory),
            "none" => Ok(StoreBackend::None),
            other => Err(format!("unknown backend '{}' (expected disk, memory or none)", other)),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub directory: PathBuf,
}

/// `[ledger]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSettings {
    pub path: PathBuf,
    pub registry_key: String,
    pub default_box: String,
}

/// `[fetch]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    /// Base URL for resolving relative URLs; `None` accepts only absolute URLs.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    /// Log file; `None` logs to stderr only.
    pub file: Option<PathBuf>,
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub store: StoreSettings,
    pub ledger: LedgerSettings,
    pub fetch: FetchSettings,
    pub logging: LoggingSettings,
}

/// `~/.cachebox`, or `./.cachebox` if the home directory is unknown.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cachebox")
}

/// Default configuration file location.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.ini")
}

impl Default for ConfigFile {
    fn default() -> Self {
        let dir = config_dir();
        Self {
            store: StoreSettings {
                backend: StoreBackend::Disk,
                directory: dir.join("store"),
            },
            ledger: LedgerSettings {
                path: dir.join("ledger.json"),
                registry_key: DEFAULT_REGISTRY_KEY.to_string(),
                default_box: DEFAULT_BOX_NAME.to_string(),
            },
            fetch: FetchSettings {
                base_url: None,
                timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                file: Some(dir.join("cachebox.log")),
            },
        }
    }
}

impl ConfigFile {
    /// Load from the default location, or defaults if the file is missing.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, or defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigFileError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        let get = |section: &str, key: &str| -> Option<String> {
            ini.section(Some(section))
                .and_then(|s| s.get(key))
                .map(|v| v.trim().to_string())
        };

        if let Some(v) = get("store", "backend") {
            config.store.backend = v.parse().map_err(|reason| ConfigFileError::InvalidValue {
                key: "store.backend".to_string(),
                reason,
            })?;
        }
        if let Some(v) = get("store", "directory").filter(|v| !v.is_empty()) {
            config.store.directory = expand_tilde(&v);
        }
        if let Some(v) = get("ledger", "path").filter(|v| !v.is_empty()) {
            config.ledger.path = expand_tilde(&v);
        }
        if let Some(v) = get("ledger", "registry_key").filter(|v| !v.is_empty()) {
            config.ledger.registry_key = v;
        }
        if let Some(v) = get("ledger", "default_box").filter(|v| !v.is_empty()) {
            config.ledger.default_box = v;
        }
        if let Some(v) = get("fetch", "base_url") {
            config.fetch.base_url = Some(v).filter(|v| !v.is_empty());
        }
        if let Some(v) = get("fetch", "timeout_secs") {
            let invalid = |reason: String| ConfigFileError::InvalidValue {
                key: "fetch.timeout_secs".to_string(),
                reason,
            };
            let secs: u64 = v
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
            if secs == 0 {
                return Err(invalid("timeout must be at least 1 second".to_string()));
            }
            config.fetch.timeout_secs = secs;
        }
        if let Some(v) = get("logging", "level").filter(|v| !v.is_empty()) {
            config.logging.level = v;
        }
        if let Some(v) = get("logging", "file") {
            config.logging.file = Some(v).filter(|v| !v.is_empty()).map(|v| expand_tilde(&v));
        }

        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut ini = Ini::new();
        ini.with_section(Some("store"))
            .set("backend", self.store.backend.to_string())
            .set("directory", self.store.directory.display().to_string());
        ini.with_section(Some("ledger"))
            .set("path", self.ledger.path.display().to_string())
            .set("registry_key", self.ledger.registry_key.as_str())
            .set("default_box", self.ledger.default_box.as_str());
        ini.with_section(Some("fetch"))
            .set("base_url", self.fetch.base_url.clone().unwrap_or_default())
            .set("timeout_secs", self.fetch.timeout_secs.to_string());
        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set(
                "file",
                self.logging
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            );

        ini.write_to_file(path)?;
        Ok(())
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("nope.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.ledger.default_box, "default");
        assert_eq!(config.ledger.registry_key, "boxes:registry");
        assert_eq!(config.store.backend, StoreBackend::Disk);
    }

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(
            &path,
            "[store]\nbackend = memory\n\n[fetch]\nbase_url = https://app.example/\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = ConfigFile::load_from(&path).unwrap();

        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.fetch.base_url.as_deref(), Some("https://app.example/"));
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.ledger, ConfigFile::default().ledger);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[store]\nbackend = cloud\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("store.backend"));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[fetch]\ntimeout_secs = 0\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("fetch.timeout_secs"));
        assert!(err.to_string().contains("at least 1 second"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("config.ini");

        let mut config = ConfigFile::default();
        config.store.backend = StoreBackend::None;
        config.ledger.default_box = "precache".to_string();
        config.fetch.base_url = Some("https://app.example/".to_string());
        config.logging.file = None;
        config.save_to(&path).unwrap();

        assert_eq!(ConfigFile::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x"), home.join("x"));
        }
    }
}
