use classroom_core::model::{AttendanceRecord, ReportPeriod, StudentId};

use super::SqliteRepository;
use super::mapping::{bool_to_i64, conn, id_to_i64, map_attendance_row};
use crate::repository::{AttendanceRepository, StorageError};

#[async_trait::async_trait]
impl AttendanceRepository for SqliteRepository {
    async fn record_attendance(&self, record: &AttendanceRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO attendance (student_id, date, present)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(student_id, date) DO UPDATE SET present = excluded.present
            ",
        )
        .bind(id_to_i64("student_id", record.student_id.value())?)
        .bind(record.date)
        .bind(bool_to_i64(record.present))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn attendance_for_student(
        &self,
        student_id: StudentId,
        period: ReportPeriod,
    ) -> Result<Vec<AttendanceRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT student_id, date, present
            FROM attendance
            WHERE student_id = ?1 AND date >= ?2 AND date <= ?3
            ORDER BY date ASC
            ",
        )
        .bind(id_to_i64("student_id", student_id.value())?)
        .bind(period.start())
        .bind(period.end())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attendance_row).collect()
    }
}
