//! Logging setup.
//!
//! Two sinks are installed: a detailed log file (`referada.log` in the
//! configured directory) and a terse stderr stream for the user. `RUST_LOG`
//! overrides the file filter.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, Layer as _};

/// Name of the log file inside the log directory.
pub const LOG_FILE_NAME: &str = "referada.log";

/// File filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILE_FILTER: &str = "warn,referada=debug,referada_cli=debug";

/// Keeps the background log writer alive; flushes on drop.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Console verbosity for the given flag.
pub fn console_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

/// Install the global subscriber.
///
/// Fails if the log directory cannot be created or a subscriber is already
/// installed.
pub fn init_logging(log_dir: &Path, verbose: bool) -> io::Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILE_FILTER));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_filter(file_filter);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_level(verbose));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    Ok(LoggingGuard { _guard: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_level() {
        assert_eq!(console_level(false), LevelFilter::INFO);
        assert_eq!(console_level(true), LevelFilter::DEBUG);
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(DEFAULT_FILE_FILTER.parse::<EnvFilter>().is_ok());
    }
}
