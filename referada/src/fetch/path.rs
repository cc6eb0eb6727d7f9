//! Destination paths for downloaded files.
//!
//! Every file lands at `<root>/<course-name>/<category-name>/<filename>`.
//! When that path is already occupied, either on disk or by another file of
//! the same run, `_1`, `_2`, ... is appended to the filename until a free
//! path is found.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::catalog::FileRecord;

/// Replacement for path separators inside a single path component.
const SEPARATOR_SUBSTITUTE: &str = "-";

/// Replacement for components that would otherwise be empty or relative.
const EMPTY_SUBSTITUTE: &str = "_";

/// Turn a catalog name into exactly one path component.
pub fn sanitize_component(name: &str) -> String {
    let sanitized = name.replace(['/', '\\'], SEPARATOR_SUBSTITUTE);
    match sanitized.as_str() {
        "" | "." | ".." => EMPTY_SUBSTITUTE.to_string(),
        _ => sanitized,
    }
}

/// Resolves collision-free destination paths for one run.
///
/// Paths handed out are remembered, so two files of the same run never
/// resolve to the same destination even before either has been created.
/// The resolver never creates directories.
#[derive(Debug)]
pub struct PathResolver {
    root: PathBuf,
    reserved: HashSet<PathBuf>,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            reserved: HashSet::new(),
        }
    }

    /// Directory holding the files of `file`'s course category.
    pub fn category_dir(&self, file: &FileRecord) -> PathBuf {
        self.root
            .join(sanitize_component(&file.subject_name))
            .join(sanitize_component(&file.mat_category))
    }

    /// Reserve and return a free destination for `file`.
    pub async fn resolve(&mut self, file: &FileRecord) -> PathBuf {
        let dir = self.category_dir(file);
        let filename = sanitize_component(&file.filename);

        let mut candidate = dir.join(&filename);
        let mut copy_index = 1u32;
        while self.is_taken(&candidate).await {
            candidate = dir.join(format!("{}_{}", filename, copy_index));
            copy_index += 1;
        }

        self.reserved.insert(candidate.clone());
        candidate
    }

    /// An unreadable parent counts as free; creating the file reports it.
    async fn is_taken(&self, path: &Path) -> bool {
        if self.reserved.contains(path) {
            return true;
        }
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}
