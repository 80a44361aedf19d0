//! Ledger trait and typed helpers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur reading or writing the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// I/O error persisting the ledger.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The ledger document itself could not be encoded or decoded.
    #[error("Ledger document is invalid: {0}")]
    Document(#[from] serde_json::Error),

    /// A stored value does not have the expected shape.
    #[error("Value for key '{key}' is invalid: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Durable mapping from string keys to structured values.
///
/// Ledgers are local and synchronous: every call completes its write before
/// returning, and a value written by `set` is visible to the next `get`.
pub trait Ledger: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Value>, LedgerError>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: Value) -> Result<(), LedgerError>;

    /// Delete `key`.
    ///
    /// # Returns
    ///
    /// `true` if a value was present.
    fn remove(&self, key: &str) -> Result<bool, LedgerError>;

    /// Store `value` under `key` only if the key is absent.
    ///
    /// # Returns
    ///
    /// `true` if the value was written, `false` if the key already existed.
    fn init(&self, key: &str, value: Value) -> Result<bool, LedgerError>;
}

/// Typed access on top of [`Ledger`].
pub trait LedgerExt: Ledger {
    /// Read and deserialize the value under `key`.
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LedgerError> {
        match self.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| LedgerError::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Serialize and store `value` under `key`.
    fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), LedgerError> {
        self.set(key, serde_json::to_value(value)?)
    }
}

impl<L: Ledger + ?Sized> LedgerExt for L {}
