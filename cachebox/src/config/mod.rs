//! INI configuration file.
//!
//! Configuration lives in `~/.cachebox/config.ini`. Missing files and
//! missing keys fall back to defaults, so a fresh install needs no file.
//!
//! ```ini
//! [store]
//! backend = disk
//! directory = ~/.cachebox/store
//!
//! [ledger]
//! path = ~/.cachebox/ledger.json
//! registry_key = boxes:registry
//! default_box = default
//!
//! [fetch]
//! base_url =
//! timeout_secs = 30
//!
//! [logging]
//! level = info
//! file = ~/.cachebox/cachebox.log
//! ```

mod file;
mod keys;

pub use file::{
    config_dir, config_file_path, ConfigFile, ConfigFileError, FetchSettings, LedgerSettings,
    LoggingSettings, StoreBackend, StoreSettings,
};
pub use keys::{ConfigKey, ConfigKeyError};
