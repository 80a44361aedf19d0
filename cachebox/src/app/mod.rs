//! Application bootstrap.
//!
//! `CacheBoxApp` wires the ledger, content store, fetcher and canonicalizer
//! together in one place and initializes the box registry before handing
//! out the coordinator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         CacheBoxApp                             │
//! │                                                                 │
//! │  1. Ledger (file | memory) ──► BoxRegistry::init()              │
//! │  2. Fetcher (HTTP) ──────────► ContentStore (disk | memory)     │
//! │  3. UrlCanonicalizer (optional base URL)                        │
//! │  4. CacheCoordinator ◄── all of the above                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cachebox::app::{AppConfig, CacheBoxApp};
//! use cachebox::config::ConfigFile;
//!
//! let config = AppConfig::from_config_file(&ConfigFile::load()?);
//! let app = CacheBoxApp::start(config)?;
//! app.coordinator().add_to_box("precache", "assets-v1", &urls).await?;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::CacheBoxApp;
pub use config::AppConfig;
pub use error::AppError;
