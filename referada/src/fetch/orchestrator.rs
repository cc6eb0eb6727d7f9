//! Batch download orchestrator.
//!
//! Selects the files of the filtered semester that are not downloaded yet,
//! prepares their destinations and runs one fetch unit per file. Units run
//! concurrently on the current runtime without any throughput limit; a
//! failing unit never affects its siblings, while cancelling the batch
//! token stops every unit still in flight.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::FetchConfig;
use super::error::FetchError;
use super::filter::SemesterFilter;
use super::path::PathResolver;
use super::remote::{ByteStream, RemoteFiles};
use super::state::{BatchReport, FetchOutcome};
use crate::catalog::{Catalog, FileKey};
use crate::session::SessionToken;

/// Keys of every not-yet-downloaded file in courses matching `filter`.
///
/// Keys come out in catalog order (course, category, file id).
pub fn select(catalog: &Catalog, filter: &SemesterFilter) -> Vec<FileKey> {
    catalog
        .iter()
        .filter(|(_, course)| filter.matches(course))
        .flat_map(|(course_id, course)| {
            course
                .materials
                .files
                .iter()
                .flat_map(move |(category, files)| {
                    files
                        .iter()
                        .filter(|(_, file)| !file.downloaded)
                        .map(move |(file_id, _)| FileKey::new(course_id, category, file_id))
                })
        })
        .collect()
}

/// Concurrent downloader for catalog files.
pub struct FetchOrchestrator {
    remote: Arc<dyn RemoteFiles>,
    config: FetchConfig,
}

impl FetchOrchestrator {
    pub fn new(remote: Arc<dyn RemoteFiles>, config: FetchConfig) -> Self {
        Self { remote, config }
    }

    /// Download every selected file of `catalog`.
    ///
    /// The catalog is only read; callers apply the report with
    /// [`BatchReport::apply`] once the batch has finished. When `cancel` fires
    /// running units stop where they are and leave partial files in place.
    /// Files not launched yet are recorded as aborted, and the report is
    /// marked interrupted.
    pub async fn run(
        &self,
        session: &SessionToken,
        catalog: &Catalog,
        filter: &SemesterFilter,
        cancel: CancellationToken,
    ) -> BatchReport {
        let selected = select(catalog, filter);
        let mut report = BatchReport::new(&selected);

        info!(
            filter = %filter,
            selected = selected.len(),
            total = catalog.file_count(),
            "Starting download batch"
        );

        let mut resolver = PathResolver::new(self.config.output_dir.clone());
        let mut units = JoinSet::new();

        for key in selected {
            if cancel.is_cancelled() {
                debug!(file = %key, "Batch cancelled before launch");
                report.record(FetchOutcome::Aborted { key, path: None });
                continue;
            }
            let Some(file) = catalog.file(&key) else {
                continue;
            };

            let dir = resolver.category_dir(file);
            if let Err(source) = tokio::fs::create_dir_all(&dir).await {
                let error = FetchError::CreateDir { path: dir, source };
                warn!(file = %key, error = %error, "Cannot prepare destination");
                report.record(FetchOutcome::Failed { key, error });
                continue;
            }

            let path = resolver.resolve(file).await;
            debug!(file = %key, path = %path.display(), "Queued download");
            report.record_launch(&key);

            let unit = FetchUnit {
                key,
                url: file.url.clone(),
                filename: file.filename.clone(),
                path,
                chunk_size: self.config.chunk_size,
            };
            units.spawn(unit.run(
                Arc::clone(&self.remote),
                session.clone(),
                cancel.child_token(),
            ));
        }

        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    warn!(error = %e, "Fetch unit ended without an outcome");
                    report.lost_units += 1;
                }
            }
        }

        report.interrupted = cancel.is_cancelled() && report.done_count() < report.selected();
        if report.interrupted {
            warn!(
                done = report.done_count(),
                aborted = report.aborted_count(),
                "Aborting download, some files may be incomplete and won't work properly"
            );
        }

        info!(
            done = report.done_count(),
            failed = report.failed_count(),
            aborted = report.aborted_count(),
            lost = report.lost_units,
            bytes = report.bytes_written(),
            "Download batch finished"
        );

        report
    }
}

/// One file transfer, from request to flushed destination.
struct FetchUnit {
    key: FileKey,
    url: String,
    filename: String,
    path: PathBuf,
    chunk_size: usize,
}

impl FetchUnit {
    /// Run the transfer until it finishes or `cancel` fires.
    ///
    /// The destination is only created once the response headers arrived,
    /// so a unit cancelled while waiting for them leaves nothing on disk.
    async fn run(
        self,
        remote: Arc<dyn RemoteFiles>,
        session: SessionToken,
        cancel: CancellationToken,
    ) -> FetchOutcome {
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = remote.open(&self.url, &session) => Some(opened),
        };
        let body = match opened {
            None => return self.aborted(false),
            Some(Ok(body)) => body,
            Some(Err(error)) => return self.failed(error),
        };

        let file = match tokio::fs::File::create(&self.path).await {
            Ok(file) => file,
            Err(source) => {
                let path = self.path.clone();
                return self.failed(FetchError::Write { path, source });
            }
        };

        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            written = write_body(body, file, &self.path, self.chunk_size) => Some(written),
        };
        match written {
            None => self.aborted(true),
            Some(Ok(bytes)) => {
                info!(file = %self.filename, bytes, "Completed download of {}", self.filename);
                FetchOutcome::Done {
                    key: self.key,
                    path: self.path,
                    bytes,
                }
            }
            Some(Err(error)) => self.failed(error),
        }
    }

    fn aborted(self, created: bool) -> FetchOutcome {
        if created {
            warn!(
                file = %self.filename,
                "Aborting download, [{}] may be incomplete and won't work properly",
                self.filename
            );
        } else {
            debug!(file = %self.filename, "Download cancelled before transfer started");
        }
        FetchOutcome::Aborted {
            key: self.key,
            path: created.then_some(self.path),
        }
    }

    fn failed(self, error: FetchError) -> FetchOutcome {
        warn!(file = %self.filename, error = %error, "Download failed");
        FetchOutcome::Failed {
            key: self.key,
            error,
        }
    }
}

/// Stream `body` into `file`, returning the bytes written.
async fn write_body(
    mut body: ByteStream,
    file: tokio::fs::File,
    path: &Path,
    chunk_size: usize,
) -> Result<u64, FetchError> {
    let write_error = |source| FetchError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::with_capacity(chunk_size, file);
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await.map_err(write_error)?;
        written += chunk.len() as u64;
    }
    writer.flush().await.map_err(write_error)?;

    Ok(written)
}
