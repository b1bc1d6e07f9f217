//! JSON API over the carômetro workflow and performance reports.

mod api;
mod error;

use std::sync::Arc;

use axum::{Router, routing::get};
use services::{AppServices, CarometerWorkflow, PerformanceAggregator};

/// Services shared by every request.
pub struct AppState {
    pub carometer: Arc<CarometerWorkflow>,
    pub reports: Arc<PerformanceAggregator>,
}

impl AppState {
    #[must_use]
    pub fn from_services(services: &AppServices) -> Self {
        Self {
            carometer: services.carometer(),
            reports: services.reports(),
        }
    }
}

/// Create the HTTP router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/classes/:class_id/students", get(api::class_roster))
        .route(
            "/assessments/:session_id/:student_id",
            get(api::get_assessment).put(api::put_assessment),
        )
        .route("/reports/:student_id", get(api::student_report))
        .with_state(state)
}
