//! Box data model: per-box records and the registry of box names.
//!
//! # Ledger Keys
//!
//! - Box records: `"box:{name}"` (e.g., `"box:precache"`)
//! - Registry: a single configurable key, [`DEFAULT_REGISTRY_KEY`] by default

mod record;
mod registry;

pub use record::{box_key, BoxRecord};
pub use registry::{BoxRegistry, DEFAULT_BOX_NAME, DEFAULT_REGISTRY_KEY};
