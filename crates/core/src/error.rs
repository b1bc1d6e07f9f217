use thiserror::Error;

use crate::model::{AssessmentError, ClassError, ExamError, ReportPeriodError, StudentError};

/// Any domain validation failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Student(#[from] StudentError),
    #[error(transparent)]
    Class(#[from] ClassError),
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error(transparent)]
    Exam(#[from] ExamError),
    #[error(transparent)]
    ReportPeriod(#[from] ReportPeriodError),
}
