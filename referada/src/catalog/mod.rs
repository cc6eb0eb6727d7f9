//! Course materials catalog.
//!
//! The catalog is the flat local view of the portal's nested materials
//! response:
//!
//! ```text
//! Catalog
//!   └── Course (by course id)
//!         └── Materials
//!               └── category name
//!                     └── FileRecord (by file id)
//! ```
//!
//! It is rebuilt from the remote response on every run (`parse`), receives
//! the `downloaded` flags of the previous run's snapshot (`diff`), and is
//! persisted as the next snapshot once downloads finish.

mod diff;
mod error;
mod parse;

pub use diff::{merge_snapshot, MergeStats};
pub use error::CatalogError;
pub use parse::{parse_materials, parse_materials_str};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Portal identifier of a course (`idPredmet`).
pub type CourseId = String;

/// Portal identifier of an uploaded material.
pub type FileId = String;

/// Files of one category, keyed by file id.
pub type FileMapping = BTreeMap<FileId, FileRecord>;

/// Full set of courses for the current run, keyed by course id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    courses: BTreeMap<CourseId, Course>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of courses.
    pub fn len(&self) -> usize {
        self.courses.len()
    }

    /// Whether the catalog has no courses.
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Insert a course, replacing any previous course with the same id.
    pub fn insert(&mut self, id: impl Into<CourseId>, course: Course) -> Option<Course> {
        self.courses.insert(id.into(), course)
    }

    /// Look up a course by id.
    pub fn get(&self, id: &str) -> Option<&Course> {
        self.courses.get(id)
    }

    /// Mutable look up of a course by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Course> {
        self.courses.get_mut(id)
    }

    /// Iterate over courses in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&CourseId, &Course)> {
        self.courses.iter()
    }

    /// Mutably iterate over courses in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&CourseId, &mut Course)> {
        self.courses.iter_mut()
    }

    /// Iterate over every file in the catalog together with its key.
    pub fn files(&self) -> impl Iterator<Item = (FileKey, &FileRecord)> {
        self.courses.iter().flat_map(|(course_id, course)| {
            course
                .materials
                .files
                .iter()
                .flat_map(move |(category, files)| {
                    files.iter().map(move |(file_id, file)| {
                        (FileKey::new(course_id, category, file_id), file)
                    })
                })
        })
    }

    /// Total number of files across all courses and categories.
    pub fn file_count(&self) -> usize {
        self.courses
            .values()
            .map(|course| course.materials.file_count())
            .sum()
    }

    /// Look up a file by its composite key.
    pub fn file(&self, key: &FileKey) -> Option<&FileRecord> {
        self.courses
            .get(&key.course)?
            .materials
            .files
            .get(&key.category)?
            .get(&key.file)
    }

    /// Mutable look up of a file by its composite key.
    pub fn file_mut(&mut self, key: &FileKey) -> Option<&mut FileRecord> {
        self.courses
            .get_mut(&key.course)?
            .materials
            .files
            .get_mut(&key.category)?
            .get_mut(&key.file)
    }

    /// Mark a file as downloaded.
    ///
    /// Returns `false` if the key does not name a file in this catalog.
    pub fn mark_downloaded(&mut self, key: &FileKey) -> bool {
        match self.file_mut(key) {
            Some(file) => {
                file.downloaded = true;
                true
            }
            None => false,
        }
    }
}

/// One enrolled course with its passthrough attributes.
///
/// Only `academic_year`, `semester`, `name` and the materials block are
/// interpreted locally; every other attribute is carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub academic_year: String,
    pub semester: String,

    pub track: Value,
    pub subtrack: Value,
    pub year: Value,
    pub enrollment: Value,
    pub group: Value,

    pub name: String,
    pub code: Value,
    pub ects: Value,
    pub signature: Value,
    pub signature_date: Value,
    pub grade: Value,
    pub grade_desc: Value,
    pub grade_date: Value,
    pub passed_nograde: Value,
    pub passed_nograde_kolok: Value,
    pub accepted: Value,
    pub accepted_cert: Value,

    pub materials: Materials,
}

/// Materials block of a course: change markers plus categorised files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Materials {
    pub count: Value,
    pub last_changed_dotw: Value,
    /// Course-level change marker; flags are only recovered while it is stable.
    pub last_changed_date: Value,
    pub last_changed_user: Value,
    /// Files grouped by category name.
    pub files: BTreeMap<String, FileMapping>,
}

impl Materials {
    /// Number of files across all categories.
    pub fn file_count(&self) -> usize {
        self.files.values().map(BTreeMap::len).sum()
    }
}

/// One uploaded material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub filename: String,
    pub description: Value,
    pub bytes: Value,
    pub date_uploaded: Value,
    pub user_uploaded: Value,
    pub content_type: Value,
    /// Portal-relative download URL.
    pub url: String,
    /// Local-only flag: the file was retrieved by an earlier fetch.
    #[serde(default)]
    pub downloaded: bool,

    pub subject_name: String,
    pub subject_code: Value,
    pub subject_id: CourseId,
    pub mat_category: String,
}

/// Composite identity of a file: course, category and file id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileKey {
    pub course: CourseId,
    pub category: String,
    pub file: FileId,
}

impl FileKey {
    pub fn new(
        course: impl Into<CourseId>,
        category: impl Into<String>,
        file: impl Into<FileId>,
    ) -> Self {
        Self {
            course: course.into(),
            category: category.into(),
            file: file.into(),
        }
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.course, self.category, self.file)
    }
}
