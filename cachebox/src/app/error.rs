//! Application error types.

use std::fmt;

use crate::cache::StoreError;
use crate::ledger::LedgerError;

/// Errors that can occur while bootstrapping the application.
#[derive(Debug)]
pub enum AppError {
    /// Failed to open or initialize the ledger.
    Ledger(LedgerError),

    /// Failed to create the content store or its fetcher.
    Store(StoreError),

    /// Configuration error.
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Ledger(e) => write!(f, "Failed to open ledger: {}", e),
            AppError::Store(e) => write!(f, "Failed to create content store: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Ledger(e) => Some(e),
            AppError::Store(e) => Some(e),
            AppError::Config(_) => None,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        AppError::Ledger(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}
