// Conflict Query Port (Interface)
//
// Read access to the three interval-bearing collections, scoped by instructor.

use crate::domain::{
    AvailabilityId, ConflictingEntry, InstructorId, TimeInterval, UnavailabilityId,
};
use crate::error::Result;
use async_trait::async_trait;

/// Stored interval as returned by a conflict query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalRecord {
    pub id: i64,
    pub interval: TimeInterval,
}

impl From<IntervalRecord> for ConflictingEntry {
    fn from(record: IntervalRecord) -> Self {
        ConflictingEntry {
            id: record.id,
            interval: record.interval,
        }
    }
}

/// Query interface consumed by `ScheduleConflictChecker`
#[async_trait]
pub trait ConflictQueryPort: Send + Sync {
    /// Availability windows of the instructor overlapping `overlapping`,
    /// minus `exclude_id` when given
    async fn find_availabilities(
        &self,
        instructor_id: InstructorId,
        overlapping: &TimeInterval,
        exclude_id: Option<AvailabilityId>,
    ) -> Result<Vec<IntervalRecord>>;

    /// Unavailability windows of the instructor overlapping `overlapping`,
    /// minus `exclude_id` when given
    async fn find_unavailabilities(
        &self,
        instructor_id: InstructorId,
        overlapping: &TimeInterval,
        exclude_id: Option<UnavailabilityId>,
    ) -> Result<Vec<IntervalRecord>>;

    /// Appointments with `is_accepted && is_valid` overlapping `overlapping`
    async fn find_confirmed_appointments(
        &self,
        instructor_id: InstructorId,
        overlapping: &TimeInterval,
    ) -> Result<Vec<IntervalRecord>>;
}
