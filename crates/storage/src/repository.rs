use async_trait::async_trait;
use classroom_core::model::{
    AssessmentAuditEntry, AssessmentTransition, AttendanceRecord, CarometerAssessment, Class,
    ClassId, ExamId, ExamResult, ReportPeriod, SessionId, Student, StudentId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Outcome of an assessment write: the record as stored and the edge it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAssessment {
    pub record: CarometerAssessment,
    pub transition: AssessmentTransition,
}

/// Classes and their ordered student rosters.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Persist or update a class.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the class cannot be stored.
    async fn upsert_class(&self, class: &Class) -> Result<(), StorageError>;

    /// Fetch a class by ID. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_class(&self, id: ClassId) -> Result<Option<Class>, StorageError>;

    /// All classes ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_classes(&self) -> Result<Vec<Class>, StorageError>;

    /// Persist or update a student. An update keeps the student's roster position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the student's class does not exist.
    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError>;

    /// Fetch a student by ID. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError>;

    /// Students of a class in the order they were first stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn students_in_class(&self, class_id: ClassId) -> Result<Vec<Student>, StorageError>;
}

/// Carômetro records keyed by `(session, student)`, plus their audit trail.
#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// Replace the record for `(assessment.session_id, assessment.student_id)`.
    ///
    /// Last writer wins. The read of the previous status, the write, and the
    /// audit append happen atomically; `created_at` of the first write is kept.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_assessment(
        &self,
        assessment: &CarometerAssessment,
    ) -> Result<SavedAssessment, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_assessment(
        &self,
        session_id: SessionId,
        student_id: StudentId,
    ) -> Result<Option<CarometerAssessment>, StorageError>;

    /// Every record in a session, ordered by student ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn assessments_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<CarometerAssessment>, StorageError>;

    /// The most recently updated finalized record for a student across sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn latest_finalized_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Option<CarometerAssessment>, StorageError>;

    /// Transitions recorded for one key, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn audit_trail(
        &self,
        session_id: SessionId,
        student_id: StudentId,
    ) -> Result<Vec<AssessmentAuditEntry>, StorageError>;
}

#[async_trait]
pub trait ExamRepository: Send + Sync {
    /// Insert or replace the result for `(exam, student)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn record_result(&self, result: &ExamResult) -> Result<(), StorageError>;

    /// Results taken within `period`, ordered by date then exam ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn results_for_student(
        &self,
        student_id: StudentId,
        period: ReportPeriod,
    ) -> Result<Vec<ExamResult>, StorageError>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Insert or replace the record for `(student, date)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn record_attendance(&self, record: &AttendanceRecord) -> Result<(), StorageError>;

    /// Records within `period`, ordered by date.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn attendance_for_student(
        &self,
        student_id: StudentId,
        period: ReportPeriod,
    ) -> Result<Vec<AttendanceRecord>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

type AssessmentKey = (SessionId, StudentId);

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    classes: Arc<Mutex<HashMap<ClassId, Class>>>,
    // Vec keeps first-insert order, which is the roster order.
    students: Arc<Mutex<Vec<Student>>>,
    assessments: Arc<Mutex<HashMap<AssessmentKey, CarometerAssessment>>>,
    audit: Arc<Mutex<Vec<AssessmentAuditEntry>>>,
    exam_results: Arc<Mutex<HashMap<(ExamId, StudentId), ExamResult>>>,
    attendance: Arc<Mutex<Vec<AttendanceRecord>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RosterRepository for InMemoryRepository {
    async fn upsert_class(&self, class: &Class) -> Result<(), StorageError> {
        lock(&self.classes)?.insert(class.id(), class.clone());
        Ok(())
    }

    async fn get_class(&self, id: ClassId) -> Result<Option<Class>, StorageError> {
        Ok(lock(&self.classes)?.get(&id).cloned())
    }

    async fn list_classes(&self) -> Result<Vec<Class>, StorageError> {
        let mut classes: Vec<Class> = lock(&self.classes)?.values().cloned().collect();
        classes.sort_by_key(Class::id);
        Ok(classes)
    }

    async fn upsert_student(&self, student: &Student) -> Result<(), StorageError> {
        if !lock(&self.classes)?.contains_key(&student.class_id()) {
            return Err(StorageError::NotFound);
        }
        let mut guard = lock(&self.students)?;
        match guard.iter_mut().find(|s| s.id() == student.id()) {
            Some(existing) => *existing = student.clone(),
            None => guard.push(student.clone()),
        }
        Ok(())
    }

    async fn get_student(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        Ok(lock(&self.students)?.iter().find(|s| s.id() == id).cloned())
    }

    async fn students_in_class(&self, class_id: ClassId) -> Result<Vec<Student>, StorageError> {
        Ok(lock(&self.students)?
            .iter()
            .filter(|s| s.class_id() == class_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryRepository {
    async fn save_assessment(
        &self,
        assessment: &CarometerAssessment,
    ) -> Result<SavedAssessment, StorageError> {
        let mut records = lock(&self.assessments)?;
        let mut audit = lock(&self.audit)?;

        let key = (assessment.session_id, assessment.student_id);
        let previous = records.get(&key);
        let transition =
            AssessmentTransition::between(previous.map(|p| p.status), assessment.status);
        let mut record = assessment.clone();
        if let Some(prev) = previous {
            record.created_at = prev.created_at.min(record.created_at);
        }

        records.insert(key, record.clone());
        audit.push(AssessmentAuditEntry::new(
            record.session_id,
            record.student_id,
            transition,
            record.updated_at,
        ));
        Ok(SavedAssessment { record, transition })
    }

    async fn get_assessment(
        &self,
        session_id: SessionId,
        student_id: StudentId,
    ) -> Result<Option<CarometerAssessment>, StorageError> {
        Ok(lock(&self.assessments)?
            .get(&(session_id, student_id))
            .cloned())
    }

    async fn assessments_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<CarometerAssessment>, StorageError> {
        let mut found: Vec<CarometerAssessment> = lock(&self.assessments)?
            .values()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.student_id);
        Ok(found)
    }

    async fn latest_finalized_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Option<CarometerAssessment>, StorageError> {
        Ok(lock(&self.assessments)?
            .values()
            .filter(|a| a.student_id == student_id && a.is_finalized())
            .max_by_key(|a| (a.updated_at, a.session_id))
            .cloned())
    }

    async fn audit_trail(
        &self,
        session_id: SessionId,
        student_id: StudentId,
    ) -> Result<Vec<AssessmentAuditEntry>, StorageError> {
        Ok(lock(&self.audit)?
            .iter()
            .filter(|e| e.session_id == session_id && e.student_id == student_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ExamRepository for InMemoryRepository {
    async fn record_result(&self, result: &ExamResult) -> Result<(), StorageError> {
        lock(&self.exam_results)?.insert((result.exam_id(), result.student_id()), result.clone());
        Ok(())
    }

    async fn results_for_student(
        &self,
        student_id: StudentId,
        period: ReportPeriod,
    ) -> Result<Vec<ExamResult>, StorageError> {
        let mut found: Vec<ExamResult> = lock(&self.exam_results)?
            .values()
            .filter(|r| r.student_id() == student_id && period.contains(r.taken_on()))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.taken_on(), r.exam_id()));
        Ok(found)
    }
}

#[async_trait]
impl AttendanceRepository for InMemoryRepository {
    async fn record_attendance(&self, record: &AttendanceRecord) -> Result<(), StorageError> {
        let mut guard = lock(&self.attendance)?;
        match guard
            .iter_mut()
            .find(|r| r.student_id == record.student_id && r.date == record.date)
        {
            Some(existing) => *existing = *record,
            None => guard.push(*record),
        }
        Ok(())
    }

    async fn attendance_for_student(
        &self,
        student_id: StudentId,
        period: ReportPeriod,
    ) -> Result<Vec<AttendanceRecord>, StorageError> {
        let mut found: Vec<AttendanceRecord> = lock(&self.attendance)?
            .iter()
            .filter(|r| r.student_id == student_id && period.contains(r.date))
            .copied()
            .collect();
        found.sort_by_key(|r| r.date);
        Ok(found)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub roster: Arc<dyn RosterRepository>,
    pub assessments: Arc<dyn AssessmentRepository>,
    pub exams: Arc<dyn ExamRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Wire every repository role to the same backend instance.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: RosterRepository
            + AssessmentRepository
            + ExamRepository
            + AttendanceRepository
            + Clone
            + 'static,
    {
        Self {
            roster: Arc::new(repo.clone()),
            assessments: Arc::new(repo.clone()),
            exams: Arc::new(repo.clone()),
            attendance: Arc::new(repo),
        }
    }
}
