//! Shared setup for commands that perform a run.

use referada::config::ConfigFile;
use referada::logging::{init_logging, LoggingGuard};
use tokio::runtime::Runtime;

use crate::error::CliError;

/// Loaded configuration plus the logging guard for one command.
pub struct CliRunner {
    config: ConfigFile,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load configuration and install logging.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let logging = init_logging(&config.logging.directory, verbose).map_err(CliError::Logging)?;

        Ok(Self {
            config,
            _logging: logging,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Record the command in the log file.
    pub fn log_startup(&self, command: &str) {
        tracing::info!(
            version = referada::VERSION,
            command,
            log_dir = %self.config.logging.directory.display(),
            "Referada starting"
        );
    }

    /// Single-threaded runtime on which all fetch units interleave.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }
}
