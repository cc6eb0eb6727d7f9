//! Error types for fetch units.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a single fetch unit.
///
/// These never escalate past the unit: the orchestrator records them in the
/// batch report and the sibling units keep running.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body stream broke off.
    #[error("failed to download {url}: {reason}")]
    Network { url: String, reason: String },

    /// The portal answered with a non-success status.
    #[error("GET {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// The destination directory could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    /// The destination file could not be created or written.
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}
