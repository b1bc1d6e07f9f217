use chrono::{DateTime, Utc};
use classroom_core::model::{
    AssessmentAuditEntry, AssessmentStatus, AssessmentTransition, CarometerAssessment, SessionId,
    StudentId,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_assessment_row, ser};
use crate::repository::{AssessmentRepository, SavedAssessment, StorageError};

const SELECT_ASSESSMENT: &str = r"
    SELECT session_id, student_id, attendance, participation, responsibility, sociability,
           comments, status, created_at, updated_at
    FROM carometer_assessments
";

#[async_trait::async_trait]
impl AssessmentRepository for SqliteRepository {
    async fn save_assessment(
        &self,
        assessment: &CarometerAssessment,
    ) -> Result<SavedAssessment, StorageError> {
        let session_id = id_to_i64("session_id", assessment.session_id.value())?;
        let student_id = id_to_i64("student_id", assessment.student_id.value())?;

        let mut tx = self.begin_write().await.map_err(conn)?;

        let previous = sqlx::query(
            r"
            SELECT status, created_at FROM carometer_assessments
            WHERE session_id = ?1 AND student_id = ?2
            ",
        )
        .bind(session_id)
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(conn)?;

        let mut record = assessment.clone();
        let previous_status = match previous {
            Some(row) => {
                let status: AssessmentStatus =
                    row.try_get::<String, _>("status").map_err(ser)?.parse().map_err(ser)?;
                let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;
                record.created_at = created_at.min(record.created_at);
                Some(status)
            }
            None => None,
        };
        let transition = AssessmentTransition::between(previous_status, record.status);

        sqlx::query(
            r"
            INSERT INTO carometer_assessments (
                session_id, student_id, attendance, participation, responsibility, sociability,
                comments, status, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(session_id, student_id) DO UPDATE SET
                attendance = excluded.attendance,
                participation = excluded.participation,
                responsibility = excluded.responsibility,
                sociability = excluded.sociability,
                comments = excluded.comments,
                status = excluded.status,
                updated_at = excluded.updated_at
            ",
        )
        .bind(session_id)
        .bind(student_id)
        .bind(i64::from(record.scores.attendance.value()))
        .bind(i64::from(record.scores.participation.value()))
        .bind(i64::from(record.scores.responsibility.value()))
        .bind(i64::from(record.scores.sociability.value()))
        .bind(record.comments.as_str())
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO assessment_audit (session_id, student_id, transition, recorded_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(session_id)
        .bind(student_id)
        .bind(transition.as_str())
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(SavedAssessment { record, transition })
    }

    async fn get_assessment(
        &self,
        session_id: SessionId,
        student_id: StudentId,
    ) -> Result<Option<CarometerAssessment>, StorageError> {
        let sql = format!("{SELECT_ASSESSMENT} WHERE session_id = ?1 AND student_id = ?2");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("session_id", session_id.value())?)
            .bind(id_to_i64("student_id", student_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_assessment_row).transpose()
    }

    async fn assessments_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<CarometerAssessment>, StorageError> {
        let sql = format!("{SELECT_ASSESSMENT} WHERE session_id = ?1 ORDER BY student_id ASC");
        let rows = sqlx::query(&sql)
            .bind(id_to_i64("session_id", session_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_assessment_row).collect()
    }

    async fn latest_finalized_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Option<CarometerAssessment>, StorageError> {
        let sql = format!(
            "{SELECT_ASSESSMENT} WHERE student_id = ?1 AND status = 'finalized' \
             ORDER BY updated_at DESC, session_id DESC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(id_to_i64("student_id", student_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_assessment_row).transpose()
    }

    async fn audit_trail(
        &self,
        session_id: SessionId,
        student_id: StudentId,
    ) -> Result<Vec<AssessmentAuditEntry>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT transition, recorded_at FROM assessment_audit
            WHERE session_id = ?1 AND student_id = ?2
            ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("session_id", session_id.value())?)
        .bind(id_to_i64("student_id", student_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let transition: AssessmentTransition = row
                    .try_get::<String, _>("transition")
                    .map_err(ser)?
                    .parse()
                    .map_err(ser)?;
                Ok(AssessmentAuditEntry::new(
                    session_id,
                    student_id,
                    transition,
                    row.try_get("recorded_at").map_err(ser)?,
                ))
            })
            .collect()
    }
}
