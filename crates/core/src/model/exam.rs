use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{ExamId, StudentId};

/// Upper bound of the grading scale.
pub const MAX_EXAM_SCORE: f64 = 10.0;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ExamError {
    #[error("exam score must be between 0 and 10, got {0}")]
    ScoreOutOfRange(f64),

    #[error("graded submission is missing a score")]
    MissingScore,

    #[error("unknown submission status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    InProgress,
    Submitted,
    Graded,
}

impl SubmissionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::InProgress => "in_progress",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Graded => "graded",
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = ExamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "graded" => Ok(Self::Graded),
            other => Err(ExamError::UnknownStatus(other.to_owned())),
        }
    }
}

/// One student's submission of one exam.
///
/// Only graded results feed the performance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    exam_id: ExamId,
    student_id: StudentId,
    status: SubmissionStatus,
    score: Option<f64>,
    taken_on: NaiveDate,
}

impl ExamResult {
    /// A graded result with a score on the 0–10 scale.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::ScoreOutOfRange` if `score` is not finite or outside 0..=10.
    pub fn graded(
        exam_id: ExamId,
        student_id: StudentId,
        score: f64,
        taken_on: NaiveDate,
    ) -> Result<Self, ExamError> {
        Self::from_persisted(exam_id, student_id, SubmissionStatus::Graded, Some(score), taken_on)
    }

    /// A submission that has not been graded yet.
    #[must_use]
    pub fn pending(exam_id: ExamId, student_id: StudentId, taken_on: NaiveDate) -> Self {
        Self {
            exam_id,
            student_id,
            status: SubmissionStatus::Submitted,
            score: None,
            taken_on,
        }
    }

    /// # Errors
    ///
    /// Returns `ExamError::ScoreOutOfRange` for an invalid score and
    /// `ExamError::MissingScore` for a graded row without one.
    pub fn from_persisted(
        exam_id: ExamId,
        student_id: StudentId,
        status: SubmissionStatus,
        score: Option<f64>,
        taken_on: NaiveDate,
    ) -> Result<Self, ExamError> {
        if let Some(s) = score {
            if !s.is_finite() || !(0.0..=MAX_EXAM_SCORE).contains(&s) {
                return Err(ExamError::ScoreOutOfRange(s));
            }
        }
        if status == SubmissionStatus::Graded && score.is_none() {
            return Err(ExamError::MissingScore);
        }
        Ok(Self {
            exam_id,
            student_id,
            status,
            score,
            taken_on,
        })
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    #[must_use]
    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    #[must_use]
    pub fn taken_on(&self) -> NaiveDate {
        self.taken_on
    }

    /// Score counted by reports: present only once graded.
    #[must_use]
    pub fn graded_score(&self) -> Option<f64> {
        match self.status {
            SubmissionStatus::Graded => self.score,
            _ => None,
        }
    }
}
