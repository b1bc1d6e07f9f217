use classroom_core::model::{ExamResult, ReportPeriod, StudentId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_exam_result_row};
use crate::repository::{ExamRepository, StorageError};

#[async_trait::async_trait]
impl ExamRepository for SqliteRepository {
    async fn record_result(&self, result: &ExamResult) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO exam_results (exam_id, student_id, status, score, taken_on)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(exam_id, student_id) DO UPDATE SET
                status = excluded.status,
                score = excluded.score,
                taken_on = excluded.taken_on
            ",
        )
        .bind(id_to_i64("exam_id", result.exam_id().value())?)
        .bind(id_to_i64("student_id", result.student_id().value())?)
        .bind(result.status().as_str())
        .bind(result.score())
        .bind(result.taken_on())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn results_for_student(
        &self,
        student_id: StudentId,
        period: ReportPeriod,
    ) -> Result<Vec<ExamResult>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT exam_id, student_id, status, score, taken_on
            FROM exam_results
            WHERE student_id = ?1 AND taken_on >= ?2 AND taken_on <= ?3
            ORDER BY taken_on ASC, exam_id ASC
            ",
        )
        .bind(id_to_i64("student_id", student_id.value())?)
        .bind(period.start())
        .bind(period.end())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_exam_result_row).collect()
    }
}
