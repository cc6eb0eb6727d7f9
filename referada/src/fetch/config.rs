//! Configuration for the fetch orchestrator.

use std::path::PathBuf;

/// Write buffer size used while streaming a file to disk (4 KB).
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Configuration for the fetch orchestrator.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Root of the `<course>/<category>/<file>` tree.
    pub output_dir: PathBuf,

    /// Size of the write buffer in front of each destination file.
    pub chunk_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl FetchConfig {
    /// Create a new configuration writing below `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Set the write buffer size. Zero is raised to one byte.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}
