use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::assessment::CriterionScores;
use crate::model::ids::{ClassId, ExamId, StudentId};
use crate::trend::Trend;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportPeriodError {
    #[error("report period starts ({start}) after it ends ({end})")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// Inclusive date range a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReportPeriod {
    /// # Errors
    ///
    /// Returns `ReportPeriodError::Inverted` if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportPeriodError> {
        if start > end {
            return Err(ReportPeriodError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One graded exam as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamEntry {
    pub exam_id: ExamId,
    pub score: f64,
    pub date: NaiveDate,
}

/// Derived view of a student's performance over a period.
///
/// Recomputed on every request and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub student_id: StudentId,
    pub class_id: ClassId,
    pub period: ReportPeriod,
    pub average_score: f64,
    /// Latest finalized carômetro scores; `None` if the student was never finalized.
    pub carometer: Option<CriterionScores>,
    /// Chronological, oldest first.
    pub exams: Vec<ExamEntry>,
    /// Percentage of present days; `None` without attendance records.
    pub attendance: Option<f64>,
    pub trend: Trend,
}
