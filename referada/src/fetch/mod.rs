//! Concurrent retrieval of catalog files.
//!
//! This module provides functionality for materialising catalog files on
//! disk, including:
//! - Semester selection (`filter`)
//! - Collision-free destination paths (`path`)
//! - The remote byte-stream seam (`remote`)
//! - Per-file state and batch outcomes (`state`)
//! - Batch orchestration with cancellation (`orchestrator`)
//!
//! # Architecture
//!
//! ```text
//! FetchOrchestrator
//!         │
//!         ├── SemesterFilter (which courses are eligible)
//!         │
//!         ├── PathResolver (one destination per file, no collisions)
//!         │
//!         ├── RemoteFiles (trait: streamed GET of a portal URL)
//!         │
//!         └── BatchReport (FetchStatus per file, FetchOutcome per unit)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use referada::fetch::{FetchConfig, FetchOrchestrator, SemesterFilter};
//!
//! let orchestrator = FetchOrchestrator::new(Arc::new(portal), FetchConfig::new("/home/ana/faks"));
//! let filter: SemesterFilter = "2022/2023|Zimski".parse()?;
//!
//! let report = orchestrator.run(&session, &catalog, &filter, CancellationToken::new()).await;
//! report.apply(&mut catalog);
//! ```

mod config;
mod error;
mod filter;
mod orchestrator;
mod path;
mod remote;
mod state;

pub use config::{FetchConfig, DEFAULT_CHUNK_SIZE};
pub use error::FetchError;
pub use filter::{FilterError, SemesterFilter, DEFAULT_SEMESTER_FILTER};
pub use orchestrator::{select, FetchOrchestrator};
pub use path::{sanitize_component, PathResolver};
pub use remote::{BoxFuture, ByteStream, RemoteFiles};
pub use state::{BatchReport, FetchOutcome, FetchStatus};
