//! Shared error types for the services crate.

use thiserror::Error;

use classroom_core::model::{AssessmentError, ReportPeriodError, StudentId};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the carômetro workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CarometerError {
    #[error("no student selected")]
    NoStudentSelected,
    #[error("student {0} is not on the current roster")]
    NotInRoster(StudentId),
    #[error("student {0} does not exist")]
    UnknownStudent(StudentId),
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CarometerError {
    /// True for mistakes the evaluator can fix and retry; nothing was changed.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NoStudentSelected | Self::NotInRoster(_) | Self::Assessment(_)
        )
    }
}

/// Errors emitted by `PerformanceAggregator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error(transparent)]
    Period(#[from] ReportPeriodError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
