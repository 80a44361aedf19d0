//! Durable key/value ledger.
//!
//! The ledger is the source of truth for box membership. Values are
//! `serde_json::Value` so any serde type can be stored under a string key.
//!
//! # Available Ledgers
//!
//! - [`MemoryLedger`]: process-local, for tests and ephemeral sessions
//! - [`FileLedger`]: a single JSON document on disk, rewritten atomically

mod file;
mod memory;
mod traits;

pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use traits::{Ledger, LedgerError, LedgerExt};
