use std::sync::Arc;

use classroom_core::model::{
    AssessmentStatus, AssessmentTransition, CarometerAssessment, ClassId, SessionId, Student,
    StudentId, WorkingAssessment,
};
use storage::repository::{AssessmentRepository, RosterRepository, SavedAssessment};
use tracing::{debug, info, warn};

use super::session::{CarometerSession, FinalizeOutcome};
use crate::Clock;
use crate::error::CarometerError;

/// Orchestrates carômetro sessions against persistent storage.
///
/// Every save goes to the store first; the in-memory session is only updated
/// once the write succeeded, so a failed save can simply be retried.
#[derive(Clone)]
pub struct CarometerWorkflow {
    clock: Clock,
    roster: Arc<dyn RosterRepository>,
    assessments: Arc<dyn AssessmentRepository>,
}

impl CarometerWorkflow {
    #[must_use]
    pub fn new(
        clock: Clock,
        roster: Arc<dyn RosterRepository>,
        assessments: Arc<dyn AssessmentRepository>,
    ) -> Self {
        Self {
            clock,
            roster,
            assessments,
        }
    }

    //
    // ─── SESSION LIFECYCLE ─────────────────────────────────────────────────────
    //

    /// Open a session, loading any records already saved under `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `CarometerError::Storage` if saved records cannot be read.
    pub async fn start_session(
        &self,
        session_id: SessionId,
    ) -> Result<CarometerSession, CarometerError> {
        let saved = self.assessments.assessments_for_session(session_id).await?;
        debug!(session = %session_id, saved = saved.len(), "carometer session started");
        Ok(CarometerSession::with_assessments(session_id, saved))
    }

    /// Load a class roster into the session and clear the selection.
    ///
    /// An unknown class yields an empty roster. Saved records are reloaded so
    /// writes made elsewhere since the session started are visible.
    ///
    /// # Errors
    ///
    /// Returns `CarometerError::Storage` if the roster or records cannot be read.
    /// The session is unchanged in that case.
    pub async fn select_class(
        &self,
        session: &mut CarometerSession,
        class_id: ClassId,
    ) -> Result<(), CarometerError> {
        let students = self.roster.students_in_class(class_id).await?;
        let saved = self
            .assessments
            .assessments_for_session(session.session_id())
            .await?;
        debug!(class = %class_id, students = students.len(), "roster loaded");
        session.replace_assessments(saved);
        session.set_roster(class_id, students);
        Ok(())
    }

    /// Persist the working copy of the selected student as a draft.
    ///
    /// # Errors
    ///
    /// Returns `CarometerError::NoStudentSelected` or `CarometerError::Storage`;
    /// the session is unchanged on either.
    pub async fn save_draft(
        &self,
        session: &mut CarometerSession,
    ) -> Result<AssessmentTransition, CarometerError> {
        let saved = self.persist(session, AssessmentStatus::Draft).await?;
        session.commit(saved.record);
        Ok(saved.transition)
    }

    /// Persist the working copy as finalized, then advance to the next student.
    ///
    /// # Errors
    ///
    /// Returns `CarometerError::NoStudentSelected` or `CarometerError::Storage`;
    /// the session is unchanged on either.
    pub async fn finalize(
        &self,
        session: &mut CarometerSession,
    ) -> Result<FinalizeOutcome, CarometerError> {
        let saved = self.persist(session, AssessmentStatus::Finalized).await?;
        let student_id = saved.record.student_id;
        session.commit(saved.record);
        let advanced_to = session.advance();
        match advanced_to {
            Some(next) => info!(student = %student_id, next = %next, "assessment finalized"),
            None => info!(student = %student_id, "assessment finalized, end of roster"),
        }
        Ok(FinalizeOutcome {
            transition: saved.transition,
            advanced_to,
        })
    }

    async fn persist(
        &self,
        session: &CarometerSession,
        status: AssessmentStatus,
    ) -> Result<SavedAssessment, CarometerError> {
        let record = match session.prepare(status, self.clock.now()) {
            Ok(record) => record,
            Err(err) => {
                warn!(session = %session.session_id(), error = %err, "save rejected");
                return Err(err);
            }
        };
        self.write(&record).await
    }

    async fn write(&self, record: &CarometerAssessment) -> Result<SavedAssessment, CarometerError> {
        let saved = self
            .assessments
            .save_assessment(record)
            .await
            .inspect_err(|err| {
                warn!(
                    session = %record.session_id,
                    student = %record.student_id,
                    error = %err,
                    "assessment write failed"
                );
            })?;
        if saved.transition == AssessmentTransition::Reopened {
            warn!(
                session = %record.session_id,
                student = %record.student_id,
                "finalized assessment reopened as draft"
            );
        } else {
            debug!(
                session = %record.session_id,
                student = %record.student_id,
                transition = saved.transition.as_str(),
                "assessment saved"
            );
        }
        Ok(saved)
    }

    //
    // ─── DIRECT ACCESS ─────────────────────────────────────────────────────────
    //

    /// Save one student's assessment without an interactive session.
    ///
    /// # Errors
    ///
    /// Returns `CarometerError::UnknownStudent` if the student does not exist,
    /// or `CarometerError::Storage` on backend failure.
    pub async fn save_assessment(
        &self,
        session_id: SessionId,
        student_id: StudentId,
        working: &WorkingAssessment,
        status: AssessmentStatus,
    ) -> Result<SavedAssessment, CarometerError> {
        if self.roster.get_student(student_id).await?.is_none() {
            warn!(student = %student_id, "assessment for unknown student rejected");
            return Err(CarometerError::UnknownStudent(student_id));
        }
        let previous = self.assessments.get_assessment(session_id, student_id).await?;
        let record = CarometerAssessment::replacing(
            previous.as_ref(),
            session_id,
            student_id,
            working,
            status,
            self.clock.now(),
        );
        self.write(&record).await
    }

    /// # Errors
    ///
    /// Returns `CarometerError::Storage` on backend failure.
    pub async fn assessment(
        &self,
        session_id: SessionId,
        student_id: StudentId,
    ) -> Result<Option<CarometerAssessment>, CarometerError> {
        Ok(self.assessments.get_assessment(session_id, student_id).await?)
    }

    /// Students of a class in roster order; `None` if the class does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CarometerError::Storage` on backend failure.
    pub async fn roster(&self, class_id: ClassId) -> Result<Option<Vec<Student>>, CarometerError> {
        if self.roster.get_class(class_id).await?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.roster.students_in_class(class_id).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use classroom_core::model::{AssessmentAuditEntry, Class, Criterion, CriterionScore, StudentDraft};
    use classroom_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    async fn seeded(names: &[&str]) -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        let class = Class::new(ClassId::new(1), "9º Ano A", "9º Ano", 2025, fixed_now()).unwrap();
        repo.upsert_class(&class).await.unwrap();
        for (name, id) in names.iter().zip(1..) {
            let student = StudentDraft::new(class.id(), *name)
                .validate(StudentId::new(id), fixed_now())
                .unwrap();
            repo.upsert_student(&student).await.unwrap();
        }
        repo
    }

    fn workflow(repo: &InMemoryRepository) -> CarometerWorkflow {
        CarometerWorkflow::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn finalize_persists_and_advances() {
        let repo = seeded(&["A", "B"]).await;
        let wf = workflow(&repo);
        let mut session = wf.start_session(SessionId::new(1)).await.unwrap();
        wf.select_class(&mut session, ClassId::new(1)).await.unwrap();
        session.select_student(StudentId::new(1)).unwrap();
        session.set_criterion(Criterion::Sociability, CriterionScore::MAX);

        let outcome = wf.finalize(&mut session).await.unwrap();
        assert_eq!(outcome.transition, AssessmentTransition::Finalized);
        assert_eq!(outcome.advanced_to, Some(StudentId::new(2)));

        let stored = repo
            .get_assessment(SessionId::new(1), StudentId::new(1))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.is_finalized());
        assert_eq!(stored.scores.sociability, CriterionScore::MAX);
    }

    #[tokio::test]
    async fn restarted_session_sees_saved_records() {
        let repo = seeded(&["A"]).await;
        let wf = workflow(&repo);
        let mut session = wf.start_session(SessionId::new(3)).await.unwrap();
        wf.select_class(&mut session, ClassId::new(1)).await.unwrap();
        session.select_student(StudentId::new(1)).unwrap();
        session.set_comments("needs follow-up");
        wf.save_draft(&mut session).await.unwrap();

        let mut resumed = wf.start_session(SessionId::new(3)).await.unwrap();
        wf.select_class(&mut resumed, ClassId::new(1)).await.unwrap();
        resumed.select_student(StudentId::new(1)).unwrap();
        assert_eq!(resumed.working().comments, "needs follow-up");
        assert_eq!(resumed.working().status, Some(AssessmentStatus::Draft));
    }

    #[tokio::test]
    async fn unknown_class_gives_empty_roster() {
        let repo = seeded(&["A"]).await;
        let wf = workflow(&repo);
        let mut session = wf.start_session(SessionId::new(1)).await.unwrap();
        wf.select_class(&mut session, ClassId::new(42)).await.unwrap();
        assert!(session.roster().is_empty());
        assert!(wf.roster(ClassId::new(42)).await.unwrap().is_none());
        assert_eq!(wf.roster(ClassId::new(1)).await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn direct_save_rejects_unknown_student() {
        let repo = seeded(&["A"]).await;
        let wf = workflow(&repo);
        let err = wf
            .save_assessment(
                SessionId::new(1),
                StudentId::new(77),
                &WorkingAssessment::default(),
                AssessmentStatus::Draft,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CarometerError::UnknownStudent(_)));
    }

    #[tokio::test]
    async fn direct_save_reports_reopen() {
        let repo = seeded(&["A"]).await;
        let wf = workflow(&repo);
        let working = WorkingAssessment::default();
        let first = wf
            .save_assessment(SessionId::new(1), StudentId::new(1), &working, AssessmentStatus::Finalized)
            .await
            .unwrap();
        assert_eq!(first.transition, AssessmentTransition::Finalized);
        let second = wf
            .save_assessment(SessionId::new(1), StudentId::new(1), &working, AssessmentStatus::Draft)
            .await
            .unwrap();
        assert_eq!(second.transition, AssessmentTransition::Reopened);
    }

    struct FailingAssessments;

    #[async_trait]
    impl AssessmentRepository for FailingAssessments {
        async fn save_assessment(
            &self,
            _assessment: &CarometerAssessment,
        ) -> Result<SavedAssessment, StorageError> {
            Err(StorageError::Connection("disk full".into()))
        }

        async fn get_assessment(
            &self,
            _session_id: SessionId,
            _student_id: StudentId,
        ) -> Result<Option<CarometerAssessment>, StorageError> {
            Ok(None)
        }

        async fn assessments_for_session(
            &self,
            _session_id: SessionId,
        ) -> Result<Vec<CarometerAssessment>, StorageError> {
            Ok(Vec::new())
        }

        async fn latest_finalized_for_student(
            &self,
            _student_id: StudentId,
        ) -> Result<Option<CarometerAssessment>, StorageError> {
            Ok(None)
        }

        async fn audit_trail(
            &self,
            _session_id: SessionId,
            _student_id: StudentId,
        ) -> Result<Vec<AssessmentAuditEntry>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_session_untouched() {
        let repo = seeded(&["A", "B"]).await;
        let wf = CarometerWorkflow::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(FailingAssessments),
        );
        let mut session = wf.start_session(SessionId::new(1)).await.unwrap();
        wf.select_class(&mut session, ClassId::new(1)).await.unwrap();
        session.select_student(StudentId::new(1)).unwrap();
        session.set_criterion(Criterion::Attendance, CriterionScore::MIN);

        let err = wf.finalize(&mut session).await.unwrap_err();
        assert!(matches!(err, CarometerError::Storage(_)));
        assert!(!err.is_user_error());
        assert_eq!(session.selected_student().unwrap().id(), StudentId::new(1));
        assert_eq!(session.working().scores.attendance, CriterionScore::MIN);
        assert_eq!(session.saved_count(), 0);
    }
}
