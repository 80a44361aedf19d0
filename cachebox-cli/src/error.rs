//! CLI error type and exit codes.

use std::fmt;
use std::io;

use cachebox::config::ConfigFileError;
use cachebox::{AppError, CoordinatorError};

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Bad configuration or arguments.
    Config(String),
    /// The application failed to start.
    Startup(AppError),
    /// A box operation failed.
    Coordinator(CoordinatorError),
    /// Writing output failed.
    Io(io::Error),
}

impl CliError {
    /// Process exit status for this error.
    ///
    /// Namespace mismatches and ledger failures get distinct codes so
    /// scripts can tell them apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Coordinator(CoordinatorError::NamespaceMismatch { .. }) => 2,
            CliError::Coordinator(CoordinatorError::Ledger(_)) => 3,
            CliError::Startup(AppError::Ledger(_)) => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::Startup(e) => write!(f, "{}", e),
            CliError::Coordinator(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Startup(e) => Some(e),
            CliError::Coordinator(e) => Some(e),
            CliError::Io(e) => Some(e),
        }
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::Startup(e)
    }
}

impl From<CoordinatorError> for CliError {
    fn from(e: CoordinatorError) -> Self {
        CliError::Coordinator(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
