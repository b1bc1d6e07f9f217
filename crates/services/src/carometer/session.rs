use chrono::{DateTime, Utc};
use std::collections::HashMap;

use classroom_core::model::{
    AssessmentStatus, AssessmentTransition, CarometerAssessment, ClassId, Criterion,
    CriterionScore, SessionId, Student, StudentId, WorkingAssessment,
};

use super::progress::CarometerProgress;
use crate::error::CarometerError;

/// Result of finalizing the selected student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeOutcome {
    pub transition: AssessmentTransition,
    /// The student selected afterwards, if the selection moved.
    pub advanced_to: Option<StudentId>,
}

/// In-memory carômetro pass over one roster.
///
/// Holds the evaluator's working copy for the selected student and the latest
/// record of every student saved in this session. Every operation either fully
/// applies or, on a validation failure, leaves the state untouched.
#[derive(Debug, Clone)]
pub struct CarometerSession {
    session_id: SessionId,
    class_id: Option<ClassId>,
    roster: Vec<Student>,
    selected: Option<usize>,
    working: WorkingAssessment,
    assessments: HashMap<StudentId, CarometerAssessment>,
}

impl CarometerSession {
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            class_id: None,
            roster: Vec::new(),
            selected: None,
            working: WorkingAssessment::default(),
            assessments: HashMap::new(),
        }
    }

    /// Start a session that already has saved records, e.g. loaded from storage.
    ///
    /// Records from other sessions are ignored.
    #[must_use]
    pub fn with_assessments(
        session_id: SessionId,
        records: impl IntoIterator<Item = CarometerAssessment>,
    ) -> Self {
        let mut session = Self::new(session_id);
        session.replace_assessments(records);
        session
    }

    pub(crate) fn replace_assessments(
        &mut self,
        records: impl IntoIterator<Item = CarometerAssessment>,
    ) {
        let session_id = self.session_id;
        self.assessments = records
            .into_iter()
            .filter(|r| r.session_id == session_id)
            .map(|r| (r.student_id, r))
            .collect();
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn class_id(&self) -> Option<ClassId> {
        self.class_id
    }

    #[must_use]
    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    #[must_use]
    pub fn selected_student(&self) -> Option<&Student> {
        self.selected.and_then(|i| self.roster.get(i))
    }

    #[must_use]
    pub fn working(&self) -> &WorkingAssessment {
        &self.working
    }

    #[must_use]
    pub fn assessment(&self, student_id: StudentId) -> Option<&CarometerAssessment> {
        self.assessments.get(&student_id)
    }

    #[must_use]
    pub fn status_of(&self, student_id: StudentId) -> Option<AssessmentStatus> {
        self.assessments.get(&student_id).map(|a| a.status)
    }

    /// Number of saved records, including students no longer on the roster.
    #[must_use]
    pub fn saved_count(&self) -> usize {
        self.assessments.len()
    }

    #[must_use]
    pub fn progress(&self) -> CarometerProgress {
        let mut progress = CarometerProgress {
            total: self.roster.len(),
            ..CarometerProgress::default()
        };
        for student in &self.roster {
            match self.status_of(student.id()) {
                Some(AssessmentStatus::Draft) => progress.drafted += 1,
                Some(AssessmentStatus::Finalized) => progress.finalized += 1,
                None => progress.pending += 1,
            }
        }
        progress
    }

    /// Replace the roster with a class's students, in the order given.
    ///
    /// Clears the selection. An empty roster is valid.
    pub fn set_roster(&mut self, class_id: ClassId, roster: Vec<Student>) {
        self.class_id = Some(class_id);
        self.roster = roster;
        self.selected = None;
        self.working = WorkingAssessment::default();
    }

    /// Select a roster student and load their working copy.
    ///
    /// Uses the saved record verbatim when there is one, otherwise the neutral
    /// default (every criterion 3, no comments, unsaved).
    ///
    /// # Errors
    ///
    /// Returns `CarometerError::NotInRoster` if the student is not on the roster.
    pub fn select_student(&mut self, student_id: StudentId) -> Result<&Student, CarometerError> {
        let index = self
            .roster
            .iter()
            .position(|s| s.id() == student_id)
            .ok_or(CarometerError::NotInRoster(student_id))?;
        self.select_index(index);
        Ok(&self.roster[index])
    }

    fn select_index(&mut self, index: usize) {
        self.selected = Some(index);
        let student_id = self.roster[index].id();
        self.working = self
            .assessments
            .get(&student_id)
            .map(WorkingAssessment::from)
            .unwrap_or_default();
    }

    /// Edit one criterion of the working copy. Nothing is saved.
    pub fn set_criterion(&mut self, criterion: Criterion, score: CriterionScore) {
        self.working.scores.set(criterion, score);
    }

    /// Edit the free-text comments of the working copy. Nothing is saved.
    pub fn set_comments(&mut self, comments: impl Into<String>) {
        self.working.comments = comments.into();
    }

    /// Save the working copy as a draft, replacing any prior record.
    ///
    /// Saving over a finalized record reopens it; the returned transition says so.
    ///
    /// # Errors
    ///
    /// Returns `CarometerError::NoStudentSelected` without changing anything.
    pub fn save_draft(&mut self, now: DateTime<Utc>) -> Result<AssessmentTransition, CarometerError> {
        let record = self.prepare(AssessmentStatus::Draft, now)?;
        Ok(self.commit(record))
    }

    /// Save the working copy as finalized and move to the next roster student.
    ///
    /// On the last roster student the selection stays where it is.
    ///
    /// # Errors
    ///
    /// Returns `CarometerError::NoStudentSelected` without changing anything.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> Result<FinalizeOutcome, CarometerError> {
        let record = self.prepare(AssessmentStatus::Finalized, now)?;
        let transition = self.commit(record);
        let advanced_to = self.advance();
        Ok(FinalizeOutcome {
            transition,
            advanced_to,
        })
    }

    /// Build the record a save would write, without touching the session.
    pub(crate) fn prepare(
        &self,
        status: AssessmentStatus,
        now: DateTime<Utc>,
    ) -> Result<CarometerAssessment, CarometerError> {
        let student = self
            .selected_student()
            .ok_or(CarometerError::NoStudentSelected)?;
        Ok(CarometerAssessment::replacing(
            self.assessments.get(&student.id()),
            self.session_id,
            student.id(),
            &self.working,
            status,
            now,
        ))
    }

    /// Store a record as the student's current one and return the edge taken.
    pub(crate) fn commit(&mut self, record: CarometerAssessment) -> AssessmentTransition {
        let previous = self.status_of(record.student_id);
        let transition = AssessmentTransition::between(previous, record.status);
        if self.selected_student().map(Student::id) == Some(record.student_id) {
            self.working = WorkingAssessment::from(&record);
        }
        self.assessments.insert(record.student_id, record);
        transition
    }

    /// Select the roster entry after the current one, if any.
    pub(crate) fn advance(&mut self) -> Option<StudentId> {
        let next = self.selected? + 1;
        if next >= self.roster.len() {
            return None;
        }
        self.select_index(next);
        Some(self.roster[next].id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::model::{CriterionScores, StudentDraft};
    use classroom_core::time::fixed_now;

    fn roster(names: &[&str]) -> Vec<Student> {
        names
            .iter()
            .zip(1..)
            .map(|(name, id)| {
                StudentDraft::new(ClassId::new(1), *name)
                    .validate(StudentId::new(id), fixed_now())
                    .unwrap()
            })
            .collect()
    }

    fn session_with(names: &[&str]) -> CarometerSession {
        let mut session = CarometerSession::new(SessionId::new(1));
        session.set_roster(ClassId::new(1), roster(names));
        session
    }

    fn score(v: i64) -> CriterionScore {
        CriterionScore::new(v).unwrap()
    }

    #[test]
    fn save_draft_without_selection_changes_nothing() {
        let mut session = session_with(&["A", "B"]);
        let err = session.save_draft(fixed_now()).unwrap_err();
        assert!(matches!(err, CarometerError::NoStudentSelected));
        assert!(err.is_user_error());
        assert_eq!(session.saved_count(), 0);
        assert!(session.finalize(fixed_now()).is_err());
        assert_eq!(session.saved_count(), 0);
    }

    #[test]
    fn repeated_select_without_save_keeps_default() {
        let mut session = session_with(&["A", "B"]);
        session.select_student(StudentId::new(1)).unwrap();
        assert_eq!(session.working(), &WorkingAssessment::default());
        session.select_student(StudentId::new(1)).unwrap();
        assert_eq!(session.working(), &WorkingAssessment::default());
        assert!(session.working().is_unsaved());
    }

    #[test]
    fn draft_round_trips_across_selection() {
        let mut session = session_with(&["A", "B"]);
        session.select_student(StudentId::new(1)).unwrap();
        session.set_criterion(Criterion::Participation, score(1));
        session.set_comments("quiet today");
        assert_eq!(session.save_draft(fixed_now()).unwrap(), AssessmentTransition::Drafted);
        let saved = session.working().clone();

        session.select_student(StudentId::new(2)).unwrap();
        assert_eq!(session.working(), &WorkingAssessment::default());

        session.select_student(StudentId::new(1)).unwrap();
        assert_eq!(session.working(), &saved);
        assert_eq!(session.working().status, Some(AssessmentStatus::Draft));
    }

    #[test]
    fn unsaved_edits_are_discarded_on_reselect() {
        let mut session = session_with(&["A", "B"]);
        session.select_student(StudentId::new(1)).unwrap();
        session.set_criterion(Criterion::Attendance, score(0));
        session.select_student(StudentId::new(2)).unwrap();
        session.select_student(StudentId::new(1)).unwrap();
        assert_eq!(session.working().scores.attendance, CriterionScore::NEUTRAL);
    }

    #[test]
    fn finalize_advances_until_last_student() {
        let mut session = session_with(&["A", "B", "C"]);
        session.select_student(StudentId::new(2)).unwrap();
        let outcome = session.finalize(fixed_now()).unwrap();
        assert_eq!(outcome.advanced_to, Some(StudentId::new(3)));
        assert_eq!(session.selected_student().unwrap().id(), StudentId::new(3));

        let outcome = session.finalize(fixed_now()).unwrap();
        assert_eq!(outcome.advanced_to, None);
        assert_eq!(session.selected_student().unwrap().id(), StudentId::new(3));
    }

    #[test]
    fn roster_scenario_finalize_then_draft_elsewhere() {
        let mut session = session_with(&["A", "B", "C"]);
        let a = StudentId::new(1);
        session.select_student(a).unwrap();
        for (criterion, v) in Criterion::ALL.into_iter().zip([5, 4, 5, 4]) {
            session.set_criterion(criterion, score(v));
        }
        let outcome = session.finalize(fixed_now()).unwrap();
        assert_eq!(outcome.transition, AssessmentTransition::Finalized);
        assert_eq!(session.selected_student().unwrap().id(), StudentId::new(2));

        let record_a = session.assessment(a).unwrap().clone();
        assert_eq!(record_a.status, AssessmentStatus::Finalized);
        assert_eq!(record_a.scores, CriterionScores::from_values([5, 4, 5, 4]).unwrap());

        let c = StudentId::new(3);
        session.select_student(c).unwrap();
        session.save_draft(fixed_now()).unwrap();
        let record_c = session.assessment(c).unwrap();
        assert_eq!(record_c.status, AssessmentStatus::Draft);
        assert_eq!(record_c.scores, CriterionScores::default());
        assert_eq!(record_c.comments, "");

        assert_eq!(session.assessment(a), Some(&record_a));
    }

    #[test]
    fn draft_after_finalize_is_reported_as_reopen() {
        let mut session = session_with(&["A"]);
        session.select_student(StudentId::new(1)).unwrap();
        session.finalize(fixed_now()).unwrap();
        assert_eq!(
            session.save_draft(fixed_now()).unwrap(),
            AssessmentTransition::Reopened
        );
        assert_eq!(
            session.finalize(fixed_now()).unwrap().transition,
            AssessmentTransition::Finalized
        );
        assert_eq!(
            session.finalize(fixed_now()).unwrap().transition,
            AssessmentTransition::Refinalized
        );
    }

    #[test]
    fn selecting_off_roster_student_fails() {
        let mut session = session_with(&["A"]);
        let err = session.select_student(StudentId::new(9)).unwrap_err();
        assert!(matches!(err, CarometerError::NotInRoster(id) if id == StudentId::new(9)));
        assert!(session.selected_student().is_none());
    }

    #[test]
    fn new_roster_clears_selection_but_keeps_records() {
        let mut session = session_with(&["A", "B"]);
        session.select_student(StudentId::new(1)).unwrap();
        session.save_draft(fixed_now()).unwrap();

        session.set_roster(ClassId::new(2), Vec::new());
        assert!(session.selected_student().is_none());
        assert!(session.roster().is_empty());
        assert_eq!(session.saved_count(), 1);
    }

    #[test]
    fn progress_counts_roster_statuses() {
        let mut session = session_with(&["A", "B", "C"]);
        session.select_student(StudentId::new(1)).unwrap();
        session.finalize(fixed_now()).unwrap();
        session.save_draft(fixed_now()).unwrap();
        let progress = session.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.finalized, 1);
        assert_eq!(progress.drafted, 1);
        assert_eq!(progress.pending, 1);
        assert!(!progress.is_complete());
    }
}
