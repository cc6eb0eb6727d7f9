//! Fetch state tracking for one batch.
//!
//! Each file moves through
//!
//! ```text
//! Pending ──► Fetching ──► Done
//!                     └──► Aborted
//! ```
//!
//! Files that were never selected keep [`FetchStatus::NotSelected`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::error::FetchError;
use crate::catalog::{Catalog, FileKey};

/// Lifecycle state of a single file within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// The file did not pass selection.
    NotSelected,
    /// Selected, unit not launched yet.
    Pending,
    /// Unit launched and not finished.
    Fetching,
    /// Bytes fully written.
    Done,
    /// Unit failed, was cancelled, or never started.
    Aborted,
}

/// Final result of one fetch unit.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The whole body was written to `path`.
    Done {
        key: FileKey,
        path: PathBuf,
        bytes: u64,
    },
    /// The unit failed on its own; siblings were not affected.
    Failed { key: FileKey, error: FetchError },
    /// The batch was interrupted before this unit finished.
    ///
    /// `path` is set only when the destination file had been created, in
    /// which case it may hold a truncated body.
    Aborted {
        key: FileKey,
        path: Option<PathBuf>,
    },
}

impl FetchOutcome {
    pub fn key(&self) -> &FileKey {
        match self {
            Self::Done { key, .. } | Self::Failed { key, .. } | Self::Aborted { key, .. } => key,
        }
    }

    fn status(&self) -> FetchStatus {
        match self {
            Self::Done { .. } => FetchStatus::Done,
            Self::Failed { .. } | Self::Aborted { .. } => FetchStatus::Aborted,
        }
    }
}

/// Outcome of one orchestrator run.
#[derive(Debug, Default)]
pub struct BatchReport {
    statuses: BTreeMap<FileKey, FetchStatus>,
    outcomes: Vec<FetchOutcome>,
    /// Units that ended without reporting an outcome (task panic).
    pub lost_units: usize,
    /// The batch was cancelled before every unit finished.
    pub interrupted: bool,
}

impl BatchReport {
    /// Start a report for the selected files, all `Pending`.
    pub fn new(selected: &[FileKey]) -> Self {
        Self {
            statuses: selected
                .iter()
                .map(|key| (key.clone(), FetchStatus::Pending))
                .collect(),
            ..Default::default()
        }
    }

    /// Number of files that passed selection.
    pub fn selected(&self) -> usize {
        self.statuses.len()
    }

    /// Current state of `key`.
    pub fn status(&self, key: &FileKey) -> FetchStatus {
        self.statuses
            .get(key)
            .copied()
            .unwrap_or(FetchStatus::NotSelected)
    }

    /// Record that the unit for `key` has been launched.
    pub fn record_launch(&mut self, key: &FileKey) {
        if let Some(status) = self.statuses.get_mut(key) {
            *status = FetchStatus::Fetching;
        }
    }

    /// Record the final outcome of a unit.
    pub fn record(&mut self, outcome: FetchOutcome) {
        self.statuses.insert(outcome.key().clone(), outcome.status());
        self.outcomes.push(outcome);
    }

    /// Keys of files whose bytes were fully written.
    pub fn completed(&self) -> impl Iterator<Item = &FileKey> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FetchOutcome::Done { key, .. } => Some(key),
            _ => None,
        })
    }

    pub fn done_count(&self) -> usize {
        self.completed().count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FetchOutcome::Failed { .. }))
            .count()
    }

    pub fn aborted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FetchOutcome::Aborted { .. }))
            .count()
    }

    /// Total bytes written by completed units.
    pub fn bytes_written(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|outcome| match outcome {
                FetchOutcome::Done { bytes, .. } => *bytes,
                _ => 0,
            })
            .sum()
    }

    /// Files left on disk by interrupted units; these may be incomplete.
    pub fn incomplete_paths(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            FetchOutcome::Aborted {
                path: Some(path), ..
            } => Some(path.as_path()),
            _ => None,
        })
    }

    /// Mark every completed file as downloaded in `catalog`.
    ///
    /// Returns the number of flags set.
    pub fn apply(&self, catalog: &mut Catalog) -> usize {
        self.completed()
            .filter(|key| catalog.mark_downloaded(key))
            .count()
    }
}
