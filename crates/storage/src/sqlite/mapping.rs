use classroom_core::model::{
    AssessmentStatus, AttendanceRecord, CarometerAssessment, Class, ClassId, CriterionScores,
    ExamId, ExamResult, SessionId, Student, StudentDraft, StudentId, SubmissionStatus,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Ids are `u64` in the domain but `INTEGER` (i64) in `SQLite`.
pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn get_u64(row: &SqliteRow, field: &'static str) -> Result<u64, StorageError> {
    i64_to_u64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

fn get_bool(row: &SqliteRow, field: &'static str) -> Result<bool, StorageError> {
    match row.try_get::<i64, _>(field).map_err(ser)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StorageError::Serialization(format!(
            "invalid {field} flag: {other}"
        ))),
    }
}

pub(crate) fn bool_to_i64(v: bool) -> i64 {
    i64::from(v)
}

pub(crate) fn map_class_row(row: &SqliteRow) -> Result<Class, StorageError> {
    let year = i32::try_from(row.try_get::<i64, _>("year").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("year overflow".into()))?;
    Class::new(
        ClassId::new(get_u64(row, "id")?),
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("grade").map_err(ser)?,
        year,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_student_row(row: &SqliteRow) -> Result<Student, StorageError> {
    let mut draft = StudentDraft::new(
        ClassId::new(get_u64(row, "class_id")?),
        row.try_get::<String, _>("name").map_err(ser)?,
    )
    .with_email(row.try_get::<String, _>("email").map_err(ser)?);
    draft.nickname = row.try_get("nickname").map_err(ser)?;
    draft.photo_url = row.try_get("photo_url").map_err(ser)?;
    draft.photo_consent = get_bool(row, "photo_consent")?;

    draft
        .validate(
            StudentId::new(get_u64(row, "id")?),
            row.try_get("created_at").map_err(ser)?,
        )
        .map_err(ser)
}

pub(crate) fn map_assessment_row(row: &SqliteRow) -> Result<CarometerAssessment, StorageError> {
    let scores = CriterionScores::from_values([
        row.try_get::<i64, _>("attendance").map_err(ser)?,
        row.try_get::<i64, _>("participation").map_err(ser)?,
        row.try_get::<i64, _>("responsibility").map_err(ser)?,
        row.try_get::<i64, _>("sociability").map_err(ser)?,
    ])
    .map_err(ser)?;
    let status: AssessmentStatus = row
        .try_get::<String, _>("status")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;

    CarometerAssessment::from_persisted(
        SessionId::new(get_u64(row, "session_id")?),
        StudentId::new(get_u64(row, "student_id")?),
        scores,
        row.try_get::<String, _>("comments").map_err(ser)?,
        status,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_exam_result_row(row: &SqliteRow) -> Result<ExamResult, StorageError> {
    let status: SubmissionStatus = row
        .try_get::<String, _>("status")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    ExamResult::from_persisted(
        ExamId::new(get_u64(row, "exam_id")?),
        StudentId::new(get_u64(row, "student_id")?),
        status,
        row.try_get::<Option<f64>, _>("score").map_err(ser)?,
        row.try_get("taken_on").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_attendance_row(row: &SqliteRow) -> Result<AttendanceRecord, StorageError> {
    Ok(AttendanceRecord::new(
        StudentId::new(get_u64(row, "student_id")?),
        row.try_get("date").map_err(ser)?,
        get_bool(row, "present")?,
    ))
}
