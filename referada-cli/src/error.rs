//! CLI error type.

use thiserror::Error;

use referada::catalog::CatalogError;
use referada::config::ConfigError;
use referada::fetch::FilterError;
use referada::portal::PortalError;
use referada::store::StoreError;

/// Exit status used when the user interrupts a run.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No session token given. Pass --session or set REFERADA_SESSION")]
    MissingSession,

    #[error("Failed to initialise logging: {0}")]
    Logging(std::io::Error),

    #[error("Failed to create Tokio runtime: {0}")]
    Runtime(std::io::Error),

    #[error(transparent)]
    Portal(#[from] PortalError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Aborted, some files may be incomplete and won't work properly")]
    Interrupted,
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Interrupted => EXIT_INTERRUPTED,
            _ => 1,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<FilterError> for CliError {
    fn from(e: FilterError) -> Self {
        CliError::Config(e.to_string())
    }
}
