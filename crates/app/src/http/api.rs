//! Route handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use chrono::NaiveDate;
use classroom_core::model::{
    AssessmentError, AssessmentStatus, AssessmentTransition, CarometerAssessment, ClassId,
    CriterionScores, PerformanceReport, SessionId, Student, StudentId, WorkingAssessment,
};
use classroom_core::trend::{ScoreBand, score_band};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use super::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

/// A roster entry. The photo is withheld unless the student consented.
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentResponse {
    pub id: StudentId,
    pub name: String,
    pub nickname: Option<String>,
    pub email: String,
    pub photo_url: Option<String>,
}

impl From<&Student> for StudentResponse {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id(),
            name: student.name().to_owned(),
            nickname: student.nickname().map(str::to_owned),
            email: student.email().to_owned(),
            photo_url: student.display_photo().map(str::to_owned),
        }
    }
}

/// GET /classes/:class_id/students
pub async fn class_roster(
    State(state): State<Arc<AppState>>,
    class_id: Result<Path<ClassId>, PathRejection>,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let Path(class_id) = class_id?;
    let roster = state
        .carometer
        .roster(class_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("class {class_id} not found")))?;
    Ok(Json(roster.iter().map(StudentResponse::from).collect()))
}

/// GET /assessments/:session_id/:student_id
pub async fn get_assessment(
    State(state): State<Arc<AppState>>,
    key: Result<Path<(SessionId, StudentId)>, PathRejection>,
) -> Result<Json<CarometerAssessment>, ApiError> {
    let Path((session_id, student_id)) = key?;
    state
        .carometer
        .assessment(session_id, student_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "no assessment for student {student_id} in session {session_id}"
            ))
        })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CriteriaBody {
    pub attendance: i64,
    pub participation: i64,
    pub responsibility: i64,
    pub sociability: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentBody {
    pub criteria: CriteriaBody,
    #[serde(default)]
    pub comments: String,
    pub status: String,
}

impl AssessmentBody {
    fn into_parts(self) -> Result<(WorkingAssessment, AssessmentStatus), ApiError> {
        let c = self.criteria;
        let scores = CriterionScores::from_values([
            c.attendance,
            c.participation,
            c.responsibility,
            c.sociability,
        ])
        .map_err(|e| ApiError::Validation(e.to_string()))?;
        let status = self
            .status
            .parse::<AssessmentStatus>()
            .map_err(|e: AssessmentError| ApiError::Validation(e.to_string()))?;
        let working = WorkingAssessment {
            scores,
            comments: self.comments,
            status: None,
        };
        Ok((working, status))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SavedResponse {
    pub assessment: CarometerAssessment,
    pub transition: AssessmentTransition,
}

/// PUT /assessments/:session_id/:student_id
pub async fn put_assessment(
    State(state): State<Arc<AppState>>,
    key: Result<Path<(SessionId, StudentId)>, PathRejection>,
    body: Result<Json<AssessmentBody>, JsonRejection>,
) -> Result<Json<SavedResponse>, ApiError> {
    let Path((session_id, student_id)) = key?;
    let Json(body) = body?;
    let (working, status) = body.into_parts()?;
    let saved = state
        .carometer
        .save_assessment(session_id, student_id, &working, status)
        .await?;
    info!(
        session = %session_id,
        student = %student_id,
        transition = saved.transition.as_str(),
        "assessment stored via api"
    );
    Ok(Json(SavedResponse {
        assessment: saved.record,
        transition: saved.transition,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    #[serde(flatten)]
    pub report: PerformanceReport,
    pub band: ScoreBand,
}

/// GET /reports/:student_id?start=&end=
pub async fn student_report(
    State(state): State<Arc<AppState>>,
    student_id: Result<Path<StudentId>, PathRejection>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<ReportResponse>, ApiError> {
    let Path(student_id) = student_id?;
    let Query(query) = query?;
    let report = state
        .reports
        .performance_report_between(student_id, query.start, query.end)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "no graded exams for student {student_id} between {} and {}",
                query.start, query.end
            ))
        })?;
    let band = score_band(report.average_score);
    Ok(Json(ReportResponse { report, band }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::create_router;
    use crate::http::error::ErrorResponse;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use classroom_core::time::fixed_now;
    use classroom_core::trend::Trend;
    use serde_json::json;
    use services::{AppServices, Clock};
    use storage::fixtures::seed_demo;

    async fn server() -> TestServer {
        let services = AppServices::in_memory(Clock::fixed(fixed_now()));
        seed_demo(services.storage(), fixed_now()).await.unwrap();
        let state = Arc::new(AppState::from_services(&services));
        TestServer::new(create_router(state)).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let server = server().await;
        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: HealthResponse = response.json();
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn roster_is_ordered_and_unknown_class_is_404() {
        let server = server().await;
        let response = server.get("/classes/1/students").await;
        response.assert_status_ok();
        let roster: Vec<StudentResponse> = response.json();
        let names: Vec<&str> = roster.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ana Silva", "Bruno Santos", "Carla Oliveira"]);

        let response = server.get("/classes/9/students").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "NOT_FOUND");
    }

    #[tokio::test]
    async fn put_then_get_assessment() {
        let server = server().await;
        server.get("/assessments/5/3").await.assert_status(StatusCode::NOT_FOUND);

        let response = server
            .put("/assessments/5/3")
            .json(&json!({
                "criteria": {"attendance": 5, "participation": 2, "responsibility": 4, "sociability": 3},
                "comments": "shy but diligent",
                "status": "finalized"
            }))
            .await;
        response.assert_status_ok();
        let saved: SavedResponse = response.json();
        assert_eq!(saved.transition, AssessmentTransition::Finalized);

        let response = server
            .put("/assessments/5/3")
            .json(&json!({
                "criteria": {"attendance": 5, "participation": 3, "responsibility": 4, "sociability": 3},
                "status": "draft"
            }))
            .await;
        let saved: SavedResponse = response.json();
        assert_eq!(saved.transition, AssessmentTransition::Reopened);

        let stored: CarometerAssessment = server.get("/assessments/5/3").await.json();
        assert_eq!(stored.status, AssessmentStatus::Draft);
        assert_eq!(stored.scores.participation.value(), 3);
        assert_eq!(stored.comments, "");
    }

    #[tokio::test]
    async fn put_rejects_invalid_input() {
        let server = server().await;
        let response = server
            .put("/assessments/5/1")
            .json(&json!({
                "criteria": {"attendance": 6, "participation": 3, "responsibility": 3, "sociability": 3},
                "status": "draft"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_FAILED");

        let response = server
            .put("/assessments/5/1")
            .json(&json!({
                "criteria": {"attendance": 3, "participation": 3, "responsibility": 3, "sociability": 3},
                "status": "archived"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .put("/assessments/5/404")
            .json(&json!({
                "criteria": {"attendance": 3, "participation": 3, "responsibility": 3, "sociability": 3},
                "status": "draft"
            }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn report_for_seeded_student() {
        let server = server().await;
        let response = server
            .get("/reports/2")
            .add_query_param("start", "2024-01-01")
            .add_query_param("end", "2024-03-31")
            .await;
        response.assert_status_ok();
        let body: ReportResponse = response.json();
        assert!(body.report.average_score.abs() < f64::EPSILON);
        assert_eq!(body.band, ScoreBand::Low);
        assert_eq!(body.report.trend, Trend::Stable);
        assert_eq!(body.report.attendance, None);
    }

    #[tokio::test]
    async fn report_errors_map_to_status_codes() {
        let server = server().await;
        let response = server
            .get("/reports/3")
            .add_query_param("start", "2024-01-01")
            .add_query_param("end", "2024-12-31")
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        let response = server
            .get("/reports/1")
            .add_query_param("start", "2024-03-31")
            .add_query_param("end", "2024-01-01")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn malformed_assessment_body_is_validation_failure() {
        let server = server().await;
        let fractional = server
            .put("/assessments/5/1")
            .json(&json!({
                "criteria": {"attendance": 2.5, "participation": 3, "responsibility": 3, "sociability": 3},
                "status": "draft"
            }))
            .await;
        fractional.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = fractional.json();
        assert_eq!(body.code, "VALIDATION_FAILED");

        let missing_status = server
            .put("/assessments/5/1")
            .json(&json!({
                "criteria": {"attendance": 3, "participation": 3, "responsibility": 3, "sociability": 3}
            }))
            .await;
        missing_status.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = missing_status.json();
        assert_eq!(body.code, "VALIDATION_FAILED");

        let not_json = server.put("/assessments/5/1").text("criteria").await;
        not_json.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = not_json.json();
        assert_eq!(body.code, "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn missing_or_bad_report_dates_are_validation_failures() {
        let server = server().await;
        let response = server.get("/reports/1").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_FAILED");

        let response = server
            .get("/reports/1")
            .add_query_param("start", "March")
            .add_query_param("end", "2024-03-31")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn non_numeric_ids_are_validation_failures() {
        let server = server().await;
        let response = server.get("/classes/abc/students").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "VALIDATION_FAILED");
    }
}
