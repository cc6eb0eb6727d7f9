//! Semester selection.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::catalog::Course;

/// The semester downloaded by a run.
pub const DEFAULT_SEMESTER_FILTER: &str = "2022/2023|Zimski";

/// Errors parsing a semester filter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("semester filter '{0}' must have the form <academic_year>|<semester>")]
    MissingSeparator(String),
}

/// An `(academic_year, semester)` pair gating which courses are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterFilter {
    academic_year: String,
    semester: String,
}

impl SemesterFilter {
    pub fn new(academic_year: impl Into<String>, semester: impl Into<String>) -> Self {
        Self {
            academic_year: academic_year.into(),
            semester: semester.into(),
        }
    }

    pub fn academic_year(&self) -> &str {
        &self.academic_year
    }

    pub fn semester(&self) -> &str {
        &self.semester
    }

    /// Whether `course` belongs to the selected semester.
    pub fn matches(&self, course: &Course) -> bool {
        course.academic_year == self.academic_year && course.semester == self.semester
    }
}

impl FromStr for SemesterFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (academic_year, semester) = s
            .split_once('|')
            .ok_or_else(|| FilterError::MissingSeparator(s.to_string()))?;
        Ok(Self::new(academic_year, semester))
    }
}

impl fmt::Display for SemesterFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.academic_year, self.semester)
    }
}
