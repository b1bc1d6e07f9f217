#![forbid(unsafe_code)]

pub mod app_services;
pub mod carometer;
pub mod error;
pub mod report_service;

pub use classroom_core::Clock;

pub use app_services::AppServices;
pub use carometer::{CarometerProgress, CarometerSession, CarometerWorkflow, FinalizeOutcome};
pub use error::{AppServicesError, CarometerError, ReportError};
pub use report_service::PerformanceAggregator;
