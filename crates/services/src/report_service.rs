use std::sync::Arc;

use chrono::NaiveDate;
use classroom_core::model::{ExamEntry, PerformanceReport, ReportPeriod, StudentId, attendance_rate};
use classroom_core::trend::{classify_trend, mean};
use storage::repository::{
    AssessmentRepository, AttendanceRepository, ExamRepository, RosterRepository,
};
use tracing::debug;

use crate::error::ReportError;

/// Builds per-student performance reports from stored exams, attendance and
/// carômetro assessments. Reports are derived on every call.
#[derive(Clone)]
pub struct PerformanceAggregator {
    roster: Arc<dyn RosterRepository>,
    exams: Arc<dyn ExamRepository>,
    attendance: Arc<dyn AttendanceRepository>,
    assessments: Arc<dyn AssessmentRepository>,
}

impl PerformanceAggregator {
    #[must_use]
    pub fn new(
        roster: Arc<dyn RosterRepository>,
        exams: Arc<dyn ExamRepository>,
        attendance: Arc<dyn AttendanceRepository>,
        assessments: Arc<dyn AssessmentRepository>,
    ) -> Self {
        Self {
            roster,
            exams,
            attendance,
            assessments,
        }
    }

    /// Report for `student_id` over `period`.
    ///
    /// Returns `Ok(None)` when the student is unknown or has no graded exam in
    /// the period; a report is never padded with a zero average.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` on backend failure.
    pub async fn performance_report(
        &self,
        student_id: StudentId,
        period: ReportPeriod,
    ) -> Result<Option<PerformanceReport>, ReportError> {
        let Some(student) = self.roster.get_student(student_id).await? else {
            debug!(student = %student_id, "report requested for unknown student");
            return Ok(None);
        };

        let exams: Vec<ExamEntry> = self
            .exams
            .results_for_student(student_id, period)
            .await?
            .iter()
            .filter_map(|result| {
                result.graded_score().map(|score| ExamEntry {
                    exam_id: result.exam_id(),
                    score,
                    date: result.taken_on(),
                })
            })
            .collect();
        let scores: Vec<f64> = exams.iter().map(|e| e.score).collect();
        let Some(average_score) = mean(&scores) else {
            debug!(student = %student_id, "no graded exams in period");
            return Ok(None);
        };

        let carometer = self
            .assessments
            .latest_finalized_for_student(student_id)
            .await?
            .map(|assessment| assessment.scores);
        let days = self
            .attendance
            .attendance_for_student(student_id, period)
            .await?;

        Ok(Some(PerformanceReport {
            student_id,
            class_id: student.class_id(),
            period,
            average_score,
            carometer,
            trend: classify_trend(&scores),
            exams,
            attendance: attendance_rate(&days),
        }))
    }

    /// Same as [`Self::performance_report`] for raw dates.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Period` if `start` is after `end`, or
    /// `ReportError::Storage` on backend failure.
    pub async fn performance_report_between(
        &self,
        student_id: StudentId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<PerformanceReport>, ReportError> {
        let period = ReportPeriod::new(start, end)?;
        self.performance_report(student_id, period).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classroom_core::model::{
        AssessmentStatus, AttendanceRecord, CarometerAssessment, Class, ClassId, CriterionScores,
        ExamId, ExamResult, SessionId, StudentDraft, WorkingAssessment,
    };
    use classroom_core::time::fixed_now;
    use classroom_core::trend::Trend;
    use storage::repository::{InMemoryRepository, Storage};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn q1() -> ReportPeriod {
        ReportPeriod::new(day(1, 1), day(3, 31)).unwrap()
    }

    async fn setup() -> (InMemoryRepository, PerformanceAggregator) {
        let repo = InMemoryRepository::new();
        let class = Class::new(ClassId::new(1), "9º Ano A", "9º Ano", 2025, fixed_now()).unwrap();
        repo.upsert_class(&class).await.unwrap();
        let student = StudentDraft::new(class.id(), "Ana Silva")
            .validate(StudentId::new(1), fixed_now())
            .unwrap();
        repo.upsert_student(&student).await.unwrap();

        let storage = Storage::from_repository(repo.clone());
        let aggregator = PerformanceAggregator::new(
            storage.roster,
            storage.exams,
            storage.attendance,
            storage.assessments,
        );
        (repo, aggregator)
    }

    async fn grade(repo: &InMemoryRepository, exam: u64, score: f64, on: NaiveDate) {
        let result = ExamResult::graded(ExamId::new(exam), StudentId::new(1), score, on).unwrap();
        repo.record_result(&result).await.unwrap();
    }

    #[tokio::test]
    async fn perfect_then_zero_averages_five_and_declines() {
        let (repo, aggregator) = setup().await;
        grade(&repo, 1, 10.0, day(3, 2)).await;
        grade(&repo, 2, 0.0, day(3, 12)).await;

        let report = aggregator
            .performance_report(StudentId::new(1), q1())
            .await
            .unwrap()
            .unwrap();
        assert!((report.average_score - 5.0).abs() < f64::EPSILON);
        assert_eq!(report.trend, Trend::Declining);
        let order: Vec<u64> = report.exams.iter().map(|e| e.exam_id.value()).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[tokio::test]
    async fn missing_exam_data_is_not_found() {
        let (repo, aggregator) = setup().await;
        assert!(
            aggregator
                .performance_report(StudentId::new(1), q1())
                .await
                .unwrap()
                .is_none()
        );

        // Pending submissions and out-of-period grades do not count.
        repo.record_result(&ExamResult::pending(ExamId::new(1), StudentId::new(1), day(3, 5)))
            .await
            .unwrap();
        grade(&repo, 2, 9.0, day(5, 1)).await;
        assert!(
            aggregator
                .performance_report(StudentId::new(1), q1())
                .await
                .unwrap()
                .is_none()
        );

        assert!(
            aggregator
                .performance_report(StudentId::new(99), q1())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn report_includes_finalized_carometer_and_attendance() {
        let (repo, aggregator) = setup().await;
        grade(&repo, 1, 8.0, day(2, 10)).await;

        let report = aggregator
            .performance_report(StudentId::new(1), q1())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.carometer, None);
        assert_eq!(report.attendance, None);
        assert_eq!(report.trend, Trend::Stable);

        let working = WorkingAssessment {
            scores: CriterionScores::from_values([5, 4, 5, 4]).unwrap(),
            ..WorkingAssessment::default()
        };
        let draft = CarometerAssessment::replacing(
            None,
            SessionId::new(1),
            StudentId::new(1),
            &working,
            AssessmentStatus::Draft,
            fixed_now(),
        );
        repo.save_assessment(&draft).await.unwrap();
        let report = aggregator
            .performance_report(StudentId::new(1), q1())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.carometer, None);

        let finalized = CarometerAssessment::replacing(
            None,
            SessionId::new(2),
            StudentId::new(1),
            &working,
            AssessmentStatus::Finalized,
            fixed_now(),
        );
        repo.save_assessment(&finalized).await.unwrap();
        for (d, present) in [(1, true), (2, true), (3, true), (4, false)] {
            repo.record_attendance(&AttendanceRecord::new(StudentId::new(1), day(2, d), present))
                .await
                .unwrap();
        }

        let report = aggregator
            .performance_report(StudentId::new(1), q1())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.carometer, Some(working.scores));
        assert_eq!(report.attendance, Some(75.0));
        assert_eq!(report.class_id, ClassId::new(1));
    }

    #[tokio::test]
    async fn inverted_period_is_rejected() {
        let (_repo, aggregator) = setup().await;
        let err = aggregator
            .performance_report_between(StudentId::new(1), day(3, 31), day(1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Period(_)));
    }
}
