// Booking Engine - wires the scheduling services over one set of ports

use super::conflict_checker::ScheduleConflictChecker;
use super::instructor_lock::InstructorLocks;
use super::lifecycle::{AppointmentService, AvailabilityService, UnavailabilityService};
use super::recurrence::RecurrencePolicy;
use super::temporal::TemporalValidator;
use crate::config::SchedulingConfig;
use crate::domain::{
    AvailabilityId, InstructorId, Recurrence, RecurrenceRule, TimeInterval, Timestamp,
    UnavailabilityId, ValidationError,
};
use crate::error::{AppError, Result};
use crate::port::{ConflictQueryPort, ScheduleRepository, TimeProvider};
use std::sync::Arc;
use tracing::info;

pub struct BookingEngine {
    config: SchedulingConfig,
    checker: Arc<ScheduleConflictChecker>,
    temporal: Arc<TemporalValidator>,
    recurrence: Arc<RecurrencePolicy>,
    locks: Arc<InstructorLocks>,
    availabilities: AvailabilityService,
    unavailabilities: UnavailabilityService,
    appointments: AppointmentService,
}

impl BookingEngine {
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        query: Arc<dyn ConflictQueryPort>,
        time_provider: Arc<dyn TimeProvider>,
        config: SchedulingConfig,
    ) -> Self {
        let checker = Arc::new(ScheduleConflictChecker::new(query));
        let temporal = Arc::new(TemporalValidator::new(time_provider.clone()));
        let recurrence = Arc::new(RecurrencePolicy::new(time_provider.clone()));
        let locks = Arc::new(InstructorLocks::new(config.serialize_per_instructor));

        info!(
            locale = config.locale.code(),
            serialize_per_instructor = config.serialize_per_instructor,
            "Booking engine initialized"
        );

        Self {
            availabilities: AvailabilityService::new(
                repo.clone(),
                checker.clone(),
                temporal.clone(),
                recurrence.clone(),
                locks.clone(),
            ),
            unavailabilities: UnavailabilityService::new(
                repo.clone(),
                checker.clone(),
                temporal.clone(),
                locks.clone(),
            ),
            appointments: AppointmentService::new(
                repo,
                checker.clone(),
                time_provider,
                locks.clone(),
            ),
            locks,
            config,
            checker,
            temporal,
            recurrence,
        }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Lock table shared by the three lifecycle services
    pub fn locks(&self) -> &InstructorLocks {
        &self.locks
    }

    pub fn availabilities(&self) -> &AvailabilityService {
        &self.availabilities
    }

    pub fn unavailabilities(&self) -> &UnavailabilityService {
        &self.unavailabilities
    }

    pub fn appointments(&self) -> &AppointmentService {
        &self.appointments
    }

    pub fn validate_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> std::result::Result<TimeInterval, ValidationError> {
        self.temporal.validate_range(start, end)
    }

    pub fn validate_recurrence(
        &self,
        is_recurring: bool,
        recurrence_rule: Option<RecurrenceRule>,
        expiry_date: Option<Timestamp>,
        start: Timestamp,
        end: Timestamp,
    ) -> std::result::Result<Recurrence, ValidationError> {
        self.recurrence
            .validate_window(is_recurring, recurrence_rule, expiry_date, start, end)
    }

    pub async fn check_conflicts(
        &self,
        instructor_id: InstructorId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<()> {
        self.checker.check_conflicts(instructor_id, start, end).await
    }

    pub async fn check_conflicts_for_update(
        &self,
        instructor_id: InstructorId,
        start: Timestamp,
        end: Timestamp,
        exclude_availability_id: Option<AvailabilityId>,
        exclude_unavailability_id: Option<UnavailabilityId>,
    ) -> Result<()> {
        self.checker
            .check_conflicts_for_update(
                instructor_id,
                start,
                end,
                exclude_availability_id,
                exclude_unavailability_id,
            )
            .await
    }

    /// Message shown to the instructor, in the configured locale
    pub fn render_error(&self, err: &AppError) -> String {
        err.localized(self.config.locale)
    }
}
