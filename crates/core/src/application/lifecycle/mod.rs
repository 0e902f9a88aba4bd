// Lifecycle orchestrators
//
// Every write follows the same order: instructor exists, target exists and
// is owned, temporal/recurrence validation, conflict scan, persist. Nothing
// is written unless every earlier step passed.

pub mod appointment;
pub mod availability;
pub mod unavailability;

pub use appointment::{AppointmentChanges, AppointmentService, NewAppointment};
pub use availability::{AvailabilityChanges, AvailabilityService, NewAvailability};
pub use unavailability::{NewUnavailability, UnavailabilityChanges, UnavailabilityService};

use crate::domain::{Instructor, InstructorId, TimeInterval, Timestamp};
use crate::error::{AppError, EntityKind, Result};
use crate::port::ScheduleRepository;

/// Resolve `instructor_id` to an instructor; students do not qualify
pub(crate) async fn require_instructor(
    repo: &dyn ScheduleRepository,
    instructor_id: InstructorId,
) -> Result<Instructor> {
    repo.find_user(instructor_id)
        .await?
        .and_then(|user| user.as_instructor().cloned())
        .ok_or_else(|| AppError::not_found(EntityKind::Instructor, instructor_id))
}

/// Reject access to an entity owned by another instructor
pub(crate) fn ensure_owner(
    entity: EntityKind,
    id: i64,
    owner_id: InstructorId,
    instructor_id: InstructorId,
) -> Result<()> {
    if owner_id != instructor_id {
        return Err(AppError::Ownership {
            entity,
            id,
            instructor_id,
        });
    }
    Ok(())
}

/// New (start, end) when the change actually moves the interval
pub(crate) fn moved_bounds(
    current: &TimeInterval,
    start: Option<Timestamp>,
    end: Option<Timestamp>,
) -> Option<(Timestamp, Timestamp)> {
    let start = start.unwrap_or(current.start());
    let end = end.unwrap_or(current.end());

    if start == current.start() && end == current.end() {
        None
    } else {
        Some((start, end))
    }
}
