use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS classes (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        grade TEXT NOT NULL,
        year INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );
    ",
    // seq preserves roster order; upserts keep it.
    r"
    CREATE TABLE IF NOT EXISTS students (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id INTEGER NOT NULL UNIQUE,
        class_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        nickname TEXT,
        photo_url TEXT,
        photo_consent INTEGER NOT NULL CHECK (photo_consent IN (0, 1)),
        created_at TEXT NOT NULL,
        FOREIGN KEY (class_id) REFERENCES classes(id) ON DELETE CASCADE
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS carometer_assessments (
        session_id INTEGER NOT NULL,
        student_id INTEGER NOT NULL,
        attendance INTEGER NOT NULL CHECK (attendance BETWEEN 0 AND 5),
        participation INTEGER NOT NULL CHECK (participation BETWEEN 0 AND 5),
        responsibility INTEGER NOT NULL CHECK (responsibility BETWEEN 0 AND 5),
        sociability INTEGER NOT NULL CHECK (sociability BETWEEN 0 AND 5),
        comments TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('draft', 'finalized')),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (session_id, student_id)
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS assessment_audit (
        id INTEGER PRIMARY KEY,
        session_id INTEGER NOT NULL,
        student_id INTEGER NOT NULL,
        transition TEXT NOT NULL,
        recorded_at TEXT NOT NULL
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS exam_results (
        exam_id INTEGER NOT NULL,
        student_id INTEGER NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('in_progress', 'submitted', 'graded')),
        score REAL CHECK (score IS NULL OR score BETWEEN 0 AND 10),
        taken_on TEXT NOT NULL,
        PRIMARY KEY (exam_id, student_id)
    );
    ",
    r"
    CREATE TABLE IF NOT EXISTS attendance (
        student_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        present INTEGER NOT NULL CHECK (present IN (0, 1)),
        PRIMARY KEY (student_id, date)
    );
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_students_class_seq
        ON students (class_id, seq);
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_assessments_student_status_updated
        ON carometer_assessments (student_id, status, updated_at);
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_audit_key
        ON assessment_audit (session_id, student_id, id);
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_exam_results_student_taken
        ON exam_results (student_id, taken_on);
    ",
];

/// Applies pending schema versions inside one transaction each.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;
        for statement in SCHEMA_V1.iter().copied() {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}
