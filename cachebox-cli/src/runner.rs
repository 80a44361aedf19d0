//! Shared startup for commands that need a running app.

use std::path::{Path, PathBuf};

use cachebox::config::{config_file_path, ConfigFile};
use cachebox::coordinator::CacheCoordinator;
use cachebox::logging::{init_logging, LoggingGuard};
use cachebox::{AppConfig, CacheBoxApp};
use tracing::debug;

use crate::error::CliError;

/// Loads configuration, installs logging, and starts the app.
pub struct CliRunner {
    app: CacheBoxApp,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Start from the config file at `config_path`, or the default location.
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let path = resolve_config_path(config_path);
        let config = ConfigFile::load_from(&path)?;
        let logging = init_logging(&config.logging)?;
        debug!(config = %path.display(), "Loaded configuration");

        let app = CacheBoxApp::start(AppConfig::from_config_file(&config))?;
        Ok(Self {
            app,
            _logging: logging,
        })
    }

    pub fn coordinator(&self) -> &CacheCoordinator {
        self.app.coordinator()
    }
}

/// `--config` if given, otherwise `~/.cachebox/config.ini`.
pub fn resolve_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}
