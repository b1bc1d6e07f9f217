mod assessment;
mod attendance;
mod exam;
mod ids;
mod report;
mod student;

pub use ids::{ClassId, ExamId, ParseIdError, SessionId, StudentId};

pub use assessment::{
    AssessmentAuditEntry, AssessmentError, AssessmentStatus, AssessmentTransition,
    CarometerAssessment, Criterion, CriterionScore, CriterionScores, WorkingAssessment,
    criterion_label,
};
pub use attendance::{AttendanceRecord, attendance_rate};
pub use exam::{ExamError, ExamResult, MAX_EXAM_SCORE, SubmissionStatus};
pub use report::{ExamEntry, PerformanceReport, ReportPeriod, ReportPeriodError};
pub use student::{Class, ClassError, Student, StudentDraft, StudentError};
