//! cachebox - named boxes of cached HTTP responses
//!
//! A box is a named, persistent set of URLs bound to one cache namespace.
//! Boxes may share namespaces and URLs; an entry stays in the content store
//! while at least one box sharing its namespace still lists it.
//!
//! The pieces:
//!
//! - [`cache`]: content stores (disk, memory) and the fetcher that fills them
//! - [`ledger`]: small key-value persistence for box records
//! - [`boxes`]: box records and the registry of box names
//! - [`coordinator`]: the operations (add, remove, validate, heal, tidy)
//! - [`app`]: wiring everything from configuration

pub mod app;
pub mod boxes;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod ledger;
pub mod logging;
pub mod url;

pub use app::{AppConfig, AppError, CacheBoxApp};
pub use coordinator::{CacheCoordinator, CoordinatorError, ValidationStatus};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
