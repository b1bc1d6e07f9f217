use chrono::NaiveDate;
use classroom_core::model::{
    AssessmentStatus, AssessmentTransition, ClassId, Criterion, CriterionScore, CriterionScores,
    SessionId, StudentId,
};
use classroom_core::time::fixed_now;
use classroom_core::trend::Trend;
use services::{AppServices, Clock};
use storage::fixtures::seed_demo;
use storage::repository::AssessmentRepository;

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

async fn seeded_services() -> AppServices {
    let services = AppServices::in_memory(Clock::fixed(fixed_now()));
    seed_demo(services.storage(), fixed_now()).await.unwrap();
    services
}

#[tokio::test]
async fn full_roster_pass_finalizes_everyone() {
    let services = seeded_services().await;
    let workflow = services.carometer();
    let session_id = SessionId::new(20);

    let mut session = workflow.start_session(session_id).await.unwrap();
    workflow
        .select_class(&mut session, ClassId::new(1))
        .await
        .unwrap();
    assert_eq!(session.progress().pending, 3);

    let first = session.roster()[0].id();
    session.select_student(first).unwrap();
    loop {
        session.set_criterion(Criterion::Responsibility, CriterionScore::MAX);
        let outcome = workflow.finalize(&mut session).await.unwrap();
        assert_eq!(outcome.transition, AssessmentTransition::Finalized);
        if outcome.advanced_to.is_none() {
            break;
        }
    }

    assert!(session.progress().is_complete());
    let stored = services
        .storage()
        .assessments
        .assessments_for_session(session_id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|a| a.status == AssessmentStatus::Finalized));
}

#[tokio::test]
async fn reopening_is_audited() {
    let services = seeded_services().await;
    let workflow = services.carometer();
    let session_id = SessionId::new(21);
    let ana = StudentId::new(1);

    let mut session = workflow.start_session(session_id).await.unwrap();
    workflow
        .select_class(&mut session, ClassId::new(1))
        .await
        .unwrap();
    session.select_student(ana).unwrap();
    workflow.finalize(&mut session).await.unwrap();

    session.select_student(ana).unwrap();
    session.set_comments("revised after parent meeting");
    let transition = workflow.save_draft(&mut session).await.unwrap();
    assert_eq!(transition, AssessmentTransition::Reopened);

    let trail = services
        .storage()
        .assessments
        .audit_trail(session_id, ana)
        .await
        .unwrap();
    let edges: Vec<_> = trail.iter().map(|e| e.transition).collect();
    assert_eq!(
        edges,
        vec![AssessmentTransition::Finalized, AssessmentTransition::Reopened]
    );
}

#[tokio::test]
async fn demo_report_for_first_student() {
    let services = seeded_services().await;
    let report = services
        .reports()
        .performance_report_between(StudentId::new(1), day(1, 1), day(3, 31))
        .await
        .unwrap()
        .unwrap();

    assert!((report.average_score - 8.5).abs() < 1e-9);
    assert_eq!(report.trend, Trend::Declining);
    assert_eq!(report.exams.len(), 2);
    assert_eq!(
        report.carometer,
        Some(CriterionScores::from_values([5, 4, 5, 4]).unwrap())
    );
    let attendance = report.attendance.unwrap();
    assert!((attendance - 95.0).abs() < 1e-9);
}

#[tokio::test]
async fn student_without_exams_has_no_report() {
    let services = seeded_services().await;
    let report = services
        .reports()
        .performance_report_between(StudentId::new(3), day(1, 1), day(12, 31))
        .await
        .unwrap();
    assert!(report.is_none());
}
