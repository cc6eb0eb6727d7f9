//! Referada - course material downloader for the student records portal.
//!
//! This library fetches the nested materials catalog of a student's courses,
//! reconciles it with the snapshot persisted by the previous run, and
//! downloads every file that has not been retrieved yet into a
//! `<course>/<category>/<file>` tree.
//!
//! # Architecture
//!
//! ```text
//! portal ──► catalog::parse ──► Catalog ◄── catalog::diff ◄── store (Snapshot)
//!                                  │
//!                                  ▼
//!                     fetch::FetchOrchestrator ──► fetch::PathResolver
//!                                  │
//!                                  ▼
//!                      bytes on disk + store::write
//! ```

pub mod catalog;
pub mod config;
pub mod fetch;
pub mod logging;
pub mod portal;
pub mod session;
pub mod store;

/// Library version, as recorded in the package manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use catalog::{merge_snapshot, parse_materials, Catalog, CatalogError, FileKey};
pub use fetch::{BatchReport, FetchConfig, FetchOrchestrator, SemesterFilter};
pub use session::SessionToken;
pub use store::SnapshotStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_not_empty() {
        assert!(!VERSION.is_empty(), "Version should not be empty");
    }
}
