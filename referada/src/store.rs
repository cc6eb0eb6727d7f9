//! Persistence of the catalog snapshot between runs.
//!
//! The snapshot is the merged catalog of the last run, stored as pretty
//! printed JSON. Writes go to a sibling temporary file that is renamed over
//! the snapshot, so an interrupted write never leaves a half-written file.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::Catalog;

/// Errors reading or writing the snapshot file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read snapshot {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write snapshot {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to parse snapshot {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(String),
}

/// JSON file holding the previous run's catalog.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file yields an empty catalog.
    pub async fn read(&self) -> Result<Catalog, StoreError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No snapshot yet");
                return Ok(Catalog::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&content).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Read the snapshot, treating an unreadable one as empty.
    ///
    /// The snapshot only supplies `downloaded` flags, so losing it means
    /// files are fetched again rather than a failed run.
    pub async fn read_or_empty(&self) -> Catalog {
        self.read().await.unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unreadable snapshot");
            Catalog::new()
        })
    }

    /// Persist `catalog` as the new snapshot.
    pub async fn write(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let content =
            serde_json::to_vec_pretty(catalog).map_err(|e| StoreError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let staging = self.staging_path();
        tokio::fs::write(&staging, &content)
            .await
            .map_err(|source| StoreError::Write {
                path: staging.clone(),
                source,
            })?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), courses = catalog.len(), "Snapshot written");
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{add_file, course};
    use crate::catalog::FileKey;
    use serde_json::json;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert("101", course("Algoritmi", "2022/2023", "Zimski", "2022-10-01"));
        catalog.insert("202", course("Fizika", "2021/2022", "Ljetni", "2022-03-01"));
        catalog.get_mut("202").unwrap().grade = json!(5);
        add_file(&mut catalog, "101", "Predavanja", "1", "uvod.pdf");
        let key = add_file(&mut catalog, "101", "Vježbe", "2", "lab1.pdf");
        catalog.mark_downloaded(&key);
        catalog
    }

    #[tokio::test]
    async fn test_read_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("materials.json"));

        assert!(store.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read_round_trips() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("state/materials.json"));
        let catalog = catalog();

        store.write(&catalog).await.unwrap();
        let restored = store.read().await.unwrap();

        assert_eq!(restored, catalog);
        assert!(restored.file(&FileKey::new("101", "Vježbe", "2")).unwrap().downloaded);
        assert!(!temp.path().join("state/materials.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_replaces_previous_snapshot() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp.path().join("materials.json"));

        store.write(&catalog()).await.unwrap();
        store.write(&Catalog::new()).await.unwrap();

        assert!(store.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_corrupt_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("materials.json");
        std::fs::write(&path, b"{\"101\": ").unwrap();
        let store = SnapshotStore::new(&path);

        assert!(matches!(store.read().await, Err(StoreError::Parse { .. })));
        assert!(store.read_or_empty().await.is_empty());
    }
}
