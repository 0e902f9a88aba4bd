//! Schedule Conflict Checker
//!
//! Decides whether a proposed interval may be stored for an instructor.
//! Categories are scanned in a fixed order and the first non-empty one is
//! raised on its own:
//! 1. availability windows
//! 2. unavailability windows
//! 3. confirmed appointments (`is_accepted && is_valid`)

use crate::domain::interval::overlapping_with;
use crate::domain::{
    AppointmentId, AvailabilityId, ConflictError, ConflictKind, ConflictingEntry, InstructorId,
    TimeInterval, Timestamp, UnavailabilityId,
};
use crate::error::Result;
use crate::port::{ConflictQueryPort, IntervalRecord};
use std::sync::Arc;
use tracing::{debug, warn};

/// Records left out of a scan (the entity being modified)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictScope {
    pub exclude_availability: Option<AvailabilityId>,
    pub exclude_unavailability: Option<UnavailabilityId>,
    pub exclude_appointment: Option<AppointmentId>,
}

impl ConflictScope {
    /// Scope for a brand-new entity: nothing excluded
    pub fn create() -> Self {
        Self::default()
    }

    pub fn excluding_availability(id: AvailabilityId) -> Self {
        Self {
            exclude_availability: Some(id),
            ..Self::default()
        }
    }

    pub fn excluding_unavailability(id: UnavailabilityId) -> Self {
        Self {
            exclude_unavailability: Some(id),
            ..Self::default()
        }
    }

    pub fn excluding_appointment(id: AppointmentId) -> Self {
        Self {
            exclude_appointment: Some(id),
            ..Self::default()
        }
    }
}

pub struct ScheduleConflictChecker {
    query: Arc<dyn ConflictQueryPort>,
}

impl ScheduleConflictChecker {
    pub fn new(query: Arc<dyn ConflictQueryPort>) -> Self {
        Self { query }
    }

    /// Create mode: scan every stored interval of the instructor
    pub async fn check_conflicts(
        &self,
        instructor_id: InstructorId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<()> {
        let interval = TimeInterval::new(start, end)?;
        self.check_interval(instructor_id, &interval, ConflictScope::create())
            .await
    }

    /// Update mode: the availability / unavailability being edited is left out.
    ///
    /// Appointments are never excluded here; use [`check_interval`] with
    /// [`ConflictScope::excluding_appointment`] for appointment edits.
    ///
    /// [`check_interval`]: Self::check_interval
    pub async fn check_conflicts_for_update(
        &self,
        instructor_id: InstructorId,
        start: Timestamp,
        end: Timestamp,
        exclude_availability_id: Option<AvailabilityId>,
        exclude_unavailability_id: Option<UnavailabilityId>,
    ) -> Result<()> {
        let interval = TimeInterval::new(start, end)?;
        let scope = ConflictScope {
            exclude_availability: exclude_availability_id,
            exclude_unavailability: exclude_unavailability_id,
            exclude_appointment: None,
        };
        self.check_interval(instructor_id, &interval, scope).await
    }

    /// Scan the three categories in priority order, stopping at the first hit
    pub async fn check_interval(
        &self,
        instructor_id: InstructorId,
        interval: &TimeInterval,
        scope: ConflictScope,
    ) -> Result<()> {
        let records = self
            .query
            .find_availabilities(instructor_id, interval, scope.exclude_availability)
            .await?;
        self.reject_if_any(
            instructor_id,
            ConflictKind::Availability,
            conflicting(records, interval, None),
        )?;

        let records = self
            .query
            .find_unavailabilities(instructor_id, interval, scope.exclude_unavailability)
            .await?;
        self.reject_if_any(
            instructor_id,
            ConflictKind::Unavailability,
            conflicting(records, interval, None),
        )?;

        let records = self
            .query
            .find_confirmed_appointments(instructor_id, interval)
            .await?;
        self.reject_if_any(
            instructor_id,
            ConflictKind::Appointment,
            conflicting(records, interval, scope.exclude_appointment),
        )?;

        debug!(
            instructor_id = instructor_id,
            interval = %interval,
            "No schedule conflicts"
        );
        Ok(())
    }

    fn reject_if_any(
        &self,
        instructor_id: InstructorId,
        kind: ConflictKind,
        entries: Vec<ConflictingEntry>,
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        warn!(
            instructor_id = instructor_id,
            kind = %kind,
            conflicts = entries.len(),
            "Schedule conflict detected"
        );
        Err(ConflictError::new(kind, entries).into())
    }
}

/// Keep records that overlap `interval`, in read order
fn conflicting(
    records: Vec<IntervalRecord>,
    interval: &TimeInterval,
    exclude_id: Option<i64>,
) -> Vec<ConflictingEntry> {
    let overlaps_proposed = overlapping_with(*interval);
    records
        .into_iter()
        .filter(|r| Some(r.id) != exclude_id && overlaps_proposed(&r.interval))
        .map(ConflictingEntry::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Appointment, AppointmentStatus, AvailabilityWindow, Recurrence, UnavailabilityWindow,
    };
    use crate::error::AppError;
    use crate::port::schedule_repository::mocks::InMemorySchedule;
    use chrono::{TimeZone, Utc};
    use tokio_test::{assert_err, assert_ok};

    const INSTRUCTOR: InstructorId = 1;
    const OTHER_INSTRUCTOR: InstructorId = 2;

    fn at(hour: u32, minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 10, hour, minute, 0).unwrap()
    }

    fn iv(start_hour: u32, end_hour: u32) -> TimeInterval {
        TimeInterval::new(at(start_hour, 0), at(end_hour, 0)).unwrap()
    }

    fn availability(
        id: i64,
        instructor_id: InstructorId,
        interval: TimeInterval,
    ) -> AvailabilityWindow {
        AvailabilityWindow {
            id,
            instructor_id,
            interval,
            recurrence: Recurrence::Once,
            note: None,
        }
    }

    fn unavailability(id: i64, interval: TimeInterval) -> UnavailabilityWindow {
        UnavailabilityWindow {
            id,
            instructor_id: INSTRUCTOR,
            interval,
            reason: "Formation".to_string(),
        }
    }

    fn appointment(
        id: i64,
        interval: TimeInterval,
        is_accepted: bool,
        is_valid: bool,
    ) -> Appointment {
        Appointment {
            id,
            instructor_id: INSTRUCTOR,
            student_id: 10,
            meeting_point_id: 20,
            interval,
            status: AppointmentStatus::Pending,
            is_accepted,
            is_valid,
            description: None,
            created_at: at(0, 0),
            modified_at: at(0, 0),
        }
    }

    fn checker(store: Arc<InMemorySchedule>) -> ScheduleConflictChecker {
        ScheduleConflictChecker::new(store)
    }

    fn conflict_of(result: Result<()>) -> ConflictError {
        match result {
            Err(AppError::Conflict(c)) => c,
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_schedule_accepts() {
        let store = Arc::new(InMemorySchedule::new());
        assert_ok!(checker(store).check_conflicts(INSTRUCTOR, at(10, 0), at(12, 0)).await);
    }

    #[tokio::test]
    async fn test_availability_conflict_lists_window() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_availability(availability(1, INSTRUCTOR, iv(10, 12)));

        let conflict = conflict_of(
            checker(store)
                .check_conflicts(INSTRUCTOR, at(11, 0), at(13, 0))
                .await,
        );

        assert_eq!(conflict.kind(), ConflictKind::Availability);
        assert_eq!(conflict.entries().len(), 1);
        assert_eq!(conflict.entries()[0].interval, iv(10, 12));
    }

    #[tokio::test]
    async fn test_touching_interval_is_accepted() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_availability(availability(1, INSTRUCTOR, iv(10, 12)));
        store.seed_unavailability(unavailability(2, iv(14, 15)));

        let checker = checker(store);
        assert_ok!(checker.check_conflicts(INSTRUCTOR, at(12, 0), at(14, 0)).await);
        assert_ok!(checker.check_conflicts(INSTRUCTOR, at(8, 0), at(10, 0)).await);
    }

    #[tokio::test]
    async fn test_other_instructor_is_ignored() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_availability(availability(1, OTHER_INSTRUCTOR, iv(10, 12)));

        assert_ok!(
            checker(store)
                .check_conflicts(INSTRUCTOR, at(10, 0), at(12, 0))
                .await
        );
    }

    #[tokio::test]
    async fn test_priority_order_availability_first() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_appointment(appointment(3, iv(10, 11), true, true));
        store.seed_unavailability(unavailability(2, iv(10, 11)));
        store.seed_availability(availability(1, INSTRUCTOR, iv(10, 11)));

        let conflict = conflict_of(
            checker(store)
                .check_conflicts(INSTRUCTOR, at(9, 0), at(12, 0))
                .await,
        );
        assert_eq!(conflict.kind(), ConflictKind::Availability);
        assert_eq!(conflict.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailability_before_appointment() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_appointment(appointment(3, iv(10, 11), true, true));
        store.seed_unavailability(unavailability(2, iv(10, 11)));

        let conflict = conflict_of(
            checker(store)
                .check_conflicts(INSTRUCTOR, at(9, 0), at(12, 0))
                .await,
        );
        assert_eq!(conflict.kind(), ConflictKind::Unavailability);
    }

    #[tokio::test]
    async fn test_all_entries_of_category_reported() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_unavailability(unavailability(4, iv(9, 10)));
        store.seed_unavailability(unavailability(5, iv(11, 12)));
        store.seed_unavailability(unavailability(6, iv(15, 16)));

        let conflict = conflict_of(
            checker(store)
                .check_conflicts(INSTRUCTOR, at(9, 30), at(11, 30))
                .await,
        );
        let ids: Vec<_> = conflict.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_unconfirmed_appointments_do_not_block() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_appointment(appointment(1, iv(10, 12), false, true));
        store.seed_appointment(appointment(2, iv(10, 12), true, false));

        assert_ok!(
            checker(store)
                .check_conflicts(INSTRUCTOR, at(10, 0), at(12, 0))
                .await
        );
    }

    #[tokio::test]
    async fn test_confirmed_appointment_blocks() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_appointment(appointment(1, iv(10, 12), true, true));

        let conflict = conflict_of(
            checker(store)
                .check_conflicts(INSTRUCTOR, at(11, 0), at(11, 30))
                .await,
        );
        assert_eq!(conflict.kind(), ConflictKind::Appointment);
    }

    #[tokio::test]
    async fn test_update_mode_excludes_self() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_availability(availability(5, INSTRUCTOR, iv(10, 12)));
        store.seed_unavailability(unavailability(6, iv(14, 16)));
        let checker = checker(store);

        assert_ok!(
            checker
                .check_conflicts_for_update(INSTRUCTOR, at(10, 0), at(12, 0), Some(5), None)
                .await
        );
        assert_ok!(
            checker
                .check_conflicts_for_update(INSTRUCTOR, at(14, 0), at(16, 0), None, Some(6))
                .await
        );
        // excluding one availability does not hide the unavailability
        let conflict = conflict_of(
            checker
                .check_conflicts_for_update(INSTRUCTOR, at(11, 0), at(15, 0), Some(5), None)
                .await,
        );
        assert_eq!(conflict.kind(), ConflictKind::Unavailability);
    }

    #[tokio::test]
    async fn test_update_mode_never_excludes_appointments() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_appointment(appointment(7, iv(10, 12), true, true));
        let checker = checker(store);

        let conflict = conflict_of(
            checker
                .check_conflicts_for_update(INSTRUCTOR, at(10, 0), at(12, 0), Some(7), Some(7))
                .await,
        );
        assert_eq!(conflict.kind(), ConflictKind::Appointment);

        assert_ok!(
            checker
                .check_interval(
                    INSTRUCTOR,
                    &iv(10, 12),
                    ConflictScope::excluding_appointment(7)
                )
                .await
        );
    }

    #[tokio::test]
    async fn test_invalid_range_is_rejected_before_scan() {
        let store = Arc::new(InMemorySchedule::new());
        let err = assert_err!(
            checker(store)
                .check_conflicts(INSTRUCTOR, at(12, 0), at(10, 0))
                .await
        );
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_repeated_checks_are_idempotent() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_availability(availability(1, INSTRUCTOR, iv(10, 12)));
        let checker = checker(store);

        let first = conflict_of(
            checker
                .check_conflicts(INSTRUCTOR, at(11, 0), at(13, 0))
                .await,
        );
        let second = conflict_of(
            checker
                .check_conflicts(INSTRUCTOR, at(11, 0), at(13, 0))
                .await,
        );
        assert_eq!(first, second);

        assert_ok!(checker.check_conflicts(INSTRUCTOR, at(13, 0), at(14, 0)).await);
        assert_ok!(checker.check_conflicts(INSTRUCTOR, at(13, 0), at(14, 0)).await);
    }
}
