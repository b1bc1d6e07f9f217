#![forbid(unsafe_code)]

pub mod fixtures;
pub mod repository;
pub mod sqlite;

pub use repository::{
    AssessmentRepository, AttendanceRepository, ExamRepository, InMemoryRepository,
    RosterRepository, SavedAssessment, Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
