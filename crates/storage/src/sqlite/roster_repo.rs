use classroom_core::model::{Class, ClassId, Student, StudentId};

use super::SqliteRepository;
use super::mapping::{bool_to_i64, conn, id_to_i64, map_class_row, map_student_row};
use crate::repository::{RosterRepository, StorageError};

#[async_trait::async_trait]
impl RosterRepository for SqliteRepository {
    async fn upsert_class(&self, class: &Class) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO classes (id, name, grade, year, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                grade = excluded.grade,
                year = excluded.year
            ",
        )
        .bind(id_to_i64("class_id", class.id().value())?)
        .bind(class.name())
        .bind(class.grade())
        .bind(i64::from(class.year()))
        .bind(class.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_class(&self, id: ClassId) -> Result<Option<Class>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, grade, year, created_at
            FROM classes WHERE id = ?1
            ",
        )
        .bind(id_to_i64("class_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_class_row).transpose()
    }

    async fn list_classes(&self) -> Result<Vec<Class>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, grade, year, created_at
            FROM classes
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_class_row).collect()
    }

    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError> {
        let class_id = id_to_i64("class_id", student.class_id().value())?;
        let exists = sqlx::query("SELECT 1 FROM classes WHERE id = ?1")
            .bind(class_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        sqlx::query(
            r"
            INSERT INTO students (id, class_id, name, email, nickname, photo_url, photo_consent, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                class_id = excluded.class_id,
                name = excluded.name,
                email = excluded.email,
                nickname = excluded.nickname,
                photo_url = excluded.photo_url,
                photo_consent = excluded.photo_consent
            ",
        )
        .bind(id_to_i64("student_id", student.id().value())?)
        .bind(class_id)
        .bind(student.name())
        .bind(student.email())
        .bind(student.nickname())
        .bind(student.photo_url())
        .bind(bool_to_i64(student.photo_consent()))
        .bind(student.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, class_id, name, email, nickname, photo_url, photo_consent, created_at
            FROM students WHERE id = ?1
            ",
        )
        .bind(id_to_i64("student_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_student_row).transpose()
    }

    async fn students_in_class(&self, class_id: ClassId) -> Result<Vec<Student>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, class_id, name, email, nickname, photo_url, photo_consent, created_at
            FROM students
            WHERE class_id = ?1
            ORDER BY seq ASC
            ",
        )
        .bind(id_to_i64("class_id", class_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_student_row).collect()
    }
}
