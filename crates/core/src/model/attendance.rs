use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::ids::StudentId;

/// Whether a student was present on a given school day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: StudentId,
    pub date: NaiveDate,
    pub present: bool,
}

impl AttendanceRecord {
    #[must_use]
    pub fn new(student_id: StudentId, date: NaiveDate, present: bool) -> Self {
        Self {
            student_id,
            date,
            present,
        }
    }
}

/// Percentage of present days, or `None` when there are no records.
#[must_use]
pub fn attendance_rate(records: &[AttendanceRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let present = records.iter().filter(|r| r.present).count();
    #[allow(clippy::cast_precision_loss)]
    let rate = present as f64 / records.len() as f64 * 100.0;
    Some(rate)
}
