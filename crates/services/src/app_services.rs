use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::carometer::CarometerWorkflow;
use crate::error::AppServicesError;
use crate::report_service::PerformanceAggregator;

/// Assembles the carômetro workflow and report aggregator over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    carometer: Arc<CarometerWorkflow>,
    reports: Arc<PerformanceAggregator>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage, running migrations first.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock))
    }

    /// Build services over volatile in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock) -> Self {
        let carometer = Arc::new(CarometerWorkflow::new(
            clock,
            Arc::clone(&storage.roster),
            Arc::clone(&storage.assessments),
        ));
        let reports = Arc::new(PerformanceAggregator::new(
            Arc::clone(&storage.roster),
            Arc::clone(&storage.exams),
            Arc::clone(&storage.attendance),
            Arc::clone(&storage.assessments),
        ));
        Self {
            storage,
            carometer,
            reports,
        }
    }

    /// Raw repositories, for seeding and administrative tasks.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn carometer(&self) -> Arc<CarometerWorkflow> {
        Arc::clone(&self.carometer)
    }

    #[must_use]
    pub fn reports(&self) -> Arc<PerformanceAggregator> {
        Arc::clone(&self.reports)
    }
}
