//! Coordinator error types.
//!
//! Only invariant violations and ledger failures are surfaced. Content store
//! failures never appear here: they are logged where they happen and the
//! ledger stays the record of intent for a later heal.

use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors surfaced by [`CacheCoordinator`](super::CacheCoordinator) operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The caller named a namespace other than the one the box is bound to.
    #[error("Box '{box_name}' is bound to cache '{bound}', not '{requested}'")]
    NamespaceMismatch {
        box_name: String,
        bound: String,
        requested: String,
    },

    /// A box cannot be bound to an empty namespace.
    #[error("Cache name must not be empty")]
    EmptyCacheName,

    /// Reading or writing the ledger failed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl CoordinatorError {
    pub(crate) fn mismatch(box_name: &str, bound: &str, requested: &str) -> Self {
        CoordinatorError::NamespaceMismatch {
            box_name: box_name.to_string(),
            bound: bound.to_string(),
            requested: requested.to_string(),
        }
    }
}
