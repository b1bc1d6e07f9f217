//! Demo data matching the classroom's sample roster, used by the `seed` command.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use classroom_core::model::{
    AssessmentStatus, AttendanceRecord, CarometerAssessment, Class, ClassId, CriterionScores,
    ExamId, ExamResult, SessionId, StudentDraft, StudentId, WorkingAssessment,
};
use thiserror::Error;

use crate::repository::{Storage, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FixtureError {
    #[error(transparent)]
    Domain(#[from] classroom_core::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("invalid fixture date {0}")]
    Date(&'static str),
}

/// Session the sample carômetro assessments belong to.
pub const DEMO_SESSION: SessionId = SessionId::new(1);

/// Counts of what `seed_demo` wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub classes: usize,
    pub students: usize,
    pub exam_results: usize,
    pub assessments: usize,
    pub attendance_days: usize,
}

struct DemoStudent {
    id: u64,
    class_id: u64,
    name: &'static str,
    nickname: &'static str,
    email: &'static str,
    photo_seed: &'static str,
}

const STUDENTS: [DemoStudent; 5] = [
    DemoStudent { id: 1, class_id: 1, name: "Ana Silva", nickname: "Aninha", email: "ana.silva@escola.com", photo_seed: "Ana" },
    DemoStudent { id: 2, class_id: 1, name: "Bruno Santos", nickname: "Bruninho", email: "bruno.santos@escola.com", photo_seed: "Bruno" },
    DemoStudent { id: 3, class_id: 1, name: "Carla Oliveira", nickname: "Carol", email: "carla.oliveira@escola.com", photo_seed: "Carla" },
    DemoStudent { id: 4, class_id: 2, name: "Daniel Costa", nickname: "Dani", email: "daniel.costa@escola.com", photo_seed: "Daniel" },
    DemoStudent { id: 5, class_id: 2, name: "Elena Rodrigues", nickname: "Lena", email: "elena.rodrigues@escola.com", photo_seed: "Elena" },
];

fn date(y: i32, m: u32, d: u32, label: &'static str) -> Result<NaiveDate, FixtureError> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or(FixtureError::Date(label))
}

fn at_noon(day: NaiveDate, label: &'static str) -> Result<DateTime<Utc>, FixtureError> {
    day.and_hms_opt(12, 0, 0)
        .map(|t| t.and_utc())
        .ok_or(FixtureError::Date(label))
}

/// Write the sample classes, roster, exam results, finalized carômetro
/// assessments and attendance. Idempotent: every write is an upsert.
///
/// # Errors
///
/// Returns `FixtureError` if a fixture fails validation or storage rejects it.
pub async fn seed_demo(storage: &Storage, now: DateTime<Utc>) -> Result<SeedSummary, FixtureError> {
    let mut summary = SeedSummary::default();

    for (id, name, grade) in [(1, "9º Ano A", "9º Ano"), (2, "8º Ano B", "8º Ano")] {
        let class = Class::new(ClassId::new(id), name, grade, 2025, now)
            .map_err(classroom_core::Error::from)?;
        storage.roster.upsert_class(&class).await?;
        summary.classes += 1;
    }

    for s in &STUDENTS {
        let student = StudentDraft::new(ClassId::new(s.class_id), s.name)
            .with_email(s.email)
            .with_nickname(s.nickname)
            .with_photo(
                format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", s.photo_seed),
                true,
            )
            .validate(StudentId::new(s.id), now)
            .map_err(classroom_core::Error::from)?;
        storage.roster.upsert_student(&student).await?;
        summary.students += 1;
    }

    let results = [
        (1, 1, 10.0, date(2024, 3, 2, "exam 1")?),
        (2, 1, 7.0, date(2024, 3, 12, "exam 2")?),
        (1, 2, 0.0, date(2024, 3, 2, "exam 1")?),
    ];
    for (exam, student, score, taken_on) in results {
        let result = ExamResult::graded(ExamId::new(exam), StudentId::new(student), score, taken_on)
            .map_err(classroom_core::Error::from)?;
        storage.exams.record_result(&result).await?;
        summary.exam_results += 1;
    }

    let assessed_at = at_noon(date(2024, 3, 15, "carometer")?, "carometer")?;
    let assessments = [
        (1, [5, 4, 5, 4], "Excellent student, always participates."),
        (2, [4, 3, 4, 5], "Good student, participation can improve."),
    ];
    for (student, values, comments) in assessments {
        let working = WorkingAssessment {
            scores: CriterionScores::from_values(values).map_err(classroom_core::Error::from)?,
            comments: comments.to_owned(),
            status: None,
        };
        let record = CarometerAssessment::replacing(
            None,
            DEMO_SESSION,
            StudentId::new(student),
            &working,
            AssessmentStatus::Finalized,
            assessed_at,
        );
        storage.assessments.save_assessment(&record).await?;
        summary.assessments += 1;
    }

    // 20 school days from Feb 1st; Ana misses one (95%).
    let first_day = date(2024, 2, 1, "attendance")?;
    for offset in 0..20 {
        let day = first_day + Duration::days(offset);
        let record = AttendanceRecord::new(StudentId::new(1), day, offset != 7);
        storage.attendance.record_attendance(&record).await?;
        summary.attendance_days += 1;
    }

    Ok(summary)
}
