use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{SessionId, StudentId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssessmentError {
    #[error("criterion score must be between 0 and 5, got {0}")]
    ScoreOutOfRange(i64),

    #[error("unknown criterion: {0}")]
    UnknownCriterion(String),

    #[error("unknown assessment status: {0}")]
    UnknownStatus(String),

    #[error("updated_at is before created_at")]
    InvalidTimestamps,
}

//
// ─── CRITERIA ──────────────────────────────────────────────────────────────────
//

/// The four fixed behavioral criteria scored by the carômetro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Attendance,
    Participation,
    Responsibility,
    Sociability,
}

impl Criterion {
    pub const ALL: [Criterion; 4] = [
        Criterion::Attendance,
        Criterion::Participation,
        Criterion::Responsibility,
        Criterion::Sociability,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Attendance => "attendance",
            Criterion::Participation => "participation",
            Criterion::Responsibility => "responsibility",
            Criterion::Sociability => "sociability",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AssessmentError::UnknownCriterion(s.to_owned()))
    }
}

const LABELS: [&str; 6] = ["Very Low", "Low", "Regular", "Good", "Very Good", "Excellent"];

/// Display label for a raw criterion value.
///
/// Values outside 0..=5 fall back to `"Regular"`.
#[must_use]
pub fn criterion_label(value: i64) -> &'static str {
    usize::try_from(value)
        .ok()
        .and_then(|i| LABELS.get(i).copied())
        .unwrap_or(LABELS[2])
}

/// A single criterion score in 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct CriterionScore(u8);

impl CriterionScore {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(5);
    /// Midpoint used for every criterion of a fresh working assessment.
    pub const NEUTRAL: Self = Self(3);

    /// # Errors
    ///
    /// Returns `AssessmentError::ScoreOutOfRange` for values outside 0..=5.
    pub fn new(value: i64) -> Result<Self, AssessmentError> {
        match u8::try_from(value) {
            Ok(v) if v <= Self::MAX.0 => Ok(Self(v)),
            _ => Err(AssessmentError::ScoreOutOfRange(value)),
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        criterion_label(i64::from(self.0))
    }
}

impl Default for CriterionScore {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl TryFrom<i64> for CriterionScore {
    type Error = AssessmentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CriterionScore> for u8 {
    fn from(score: CriterionScore) -> Self {
        score.0
    }
}

/// Scores for all four criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CriterionScores {
    pub attendance: CriterionScore,
    pub participation: CriterionScore,
    pub responsibility: CriterionScore,
    pub sociability: CriterionScore,
}

impl CriterionScores {
    /// Build from raw values in `Criterion::ALL` order.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::ScoreOutOfRange` for the first value outside 0..=5.
    pub fn from_values(values: [i64; 4]) -> Result<Self, AssessmentError> {
        Ok(Self {
            attendance: CriterionScore::new(values[0])?,
            participation: CriterionScore::new(values[1])?,
            responsibility: CriterionScore::new(values[2])?,
            sociability: CriterionScore::new(values[3])?,
        })
    }

    #[must_use]
    pub fn get(&self, criterion: Criterion) -> CriterionScore {
        match criterion {
            Criterion::Attendance => self.attendance,
            Criterion::Participation => self.participation,
            Criterion::Responsibility => self.responsibility,
            Criterion::Sociability => self.sociability,
        }
    }

    pub fn set(&mut self, criterion: Criterion, score: CriterionScore) {
        let slot = match criterion {
            Criterion::Attendance => &mut self.attendance,
            Criterion::Participation => &mut self.participation,
            Criterion::Responsibility => &mut self.responsibility,
            Criterion::Sociability => &mut self.sociability,
        };
        *slot = score;
    }

    /// Iterate `(criterion, score)` pairs in fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (Criterion, CriterionScore)> + '_ {
        Criterion::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

//
// ─── STATUS & TRANSITIONS ──────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Draft,
    Finalized,
}

impl AssessmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssessmentStatus::Draft => "draft",
            AssessmentStatus::Finalized => "finalized",
        }
    }
}

impl FromStr for AssessmentStatus {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "finalized" => Ok(Self::Finalized),
            other => Err(AssessmentError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Named edge of the per-record state machine.
///
/// `previous == None` is the unsaved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentTransition {
    /// Unsaved → Draft
    Drafted,
    /// Draft → Draft
    Redrafted,
    /// Unsaved | Draft → Finalized
    Finalized,
    /// Finalized → Draft
    Reopened,
    /// Finalized → Finalized
    Refinalized,
}

impl AssessmentTransition {
    #[must_use]
    pub fn between(previous: Option<AssessmentStatus>, next: AssessmentStatus) -> Self {
        use AssessmentStatus::{Draft, Finalized};
        match (previous, next) {
            (None, Draft) => Self::Drafted,
            (Some(Draft), Draft) => Self::Redrafted,
            (None | Some(Draft), Finalized) => Self::Finalized,
            (Some(Finalized), Draft) => Self::Reopened,
            (Some(Finalized), Finalized) => Self::Refinalized,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drafted => "drafted",
            Self::Redrafted => "redrafted",
            Self::Finalized => "finalized",
            Self::Reopened => "reopened",
            Self::Refinalized => "refinalized",
        }
    }

    #[must_use]
    pub fn resulting_status(self) -> AssessmentStatus {
        match self {
            Self::Drafted | Self::Redrafted | Self::Reopened => AssessmentStatus::Draft,
            Self::Finalized | Self::Refinalized => AssessmentStatus::Finalized,
        }
    }
}

impl FromStr for AssessmentTransition {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drafted" => Ok(Self::Drafted),
            "redrafted" => Ok(Self::Redrafted),
            "finalized" => Ok(Self::Finalized),
            "reopened" => Ok(Self::Reopened),
            "refinalized" => Ok(Self::Refinalized),
            other => Err(AssessmentError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── WORKING COPY ──────────────────────────────────────────────────────────────
//

/// Editable copy of an assessment held while an evaluator works on a student.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkingAssessment {
    pub scores: CriterionScores,
    pub comments: String,
    /// `None` while the student has never been saved in this session.
    pub status: Option<AssessmentStatus>,
}

impl WorkingAssessment {
    #[must_use]
    pub fn is_unsaved(&self) -> bool {
        self.status.is_none()
    }
}

impl From<&CarometerAssessment> for WorkingAssessment {
    fn from(record: &CarometerAssessment) -> Self {
        Self {
            scores: record.scores,
            comments: record.comments.clone(),
            status: Some(record.status),
        }
    }
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// The current assessment of one student within one carômetro session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarometerAssessment {
    pub session_id: SessionId,
    pub student_id: StudentId,
    pub scores: CriterionScores,
    pub comments: String,
    pub status: AssessmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CarometerAssessment {
    /// Build the record that replaces `previous` (if any) for the same key.
    ///
    /// Keeps the original `created_at` so a full overwrite does not lose when
    /// the student was first scored.
    #[must_use]
    pub fn replacing(
        previous: Option<&CarometerAssessment>,
        session_id: SessionId,
        student_id: StudentId,
        working: &WorkingAssessment,
        status: AssessmentStatus,
        now: DateTime<Utc>,
    ) -> Self {
        let created_at = previous.map_or(now, |p| p.created_at.min(now));
        Self {
            session_id,
            student_id,
            scores: working.scores,
            comments: working.comments.clone(),
            status,
            created_at,
            updated_at: now,
        }
    }

    /// Rehydrate from storage.
    ///
    /// # Errors
    ///
    /// Returns `AssessmentError::InvalidTimestamps` if `updated_at < created_at`.
    pub fn from_persisted(
        session_id: SessionId,
        student_id: StudentId,
        scores: CriterionScores,
        comments: String,
        status: AssessmentStatus,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, AssessmentError> {
        if updated_at < created_at {
            return Err(AssessmentError::InvalidTimestamps);
        }
        Ok(Self {
            session_id,
            student_id,
            scores,
            comments,
            status,
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status == AssessmentStatus::Finalized
    }
}

/// Audit trail entry for one persisted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentAuditEntry {
    pub session_id: SessionId,
    pub student_id: StudentId,
    pub transition: AssessmentTransition,
    pub recorded_at: DateTime<Utc>,
}

impl AssessmentAuditEntry {
    #[must_use]
    pub fn new(
        session_id: SessionId,
        student_id: StudentId,
        transition: AssessmentTransition,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            student_id,
            transition,
            recorded_at,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
