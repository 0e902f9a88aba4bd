// Application Layer - Scheduling use cases

pub mod conflict_checker;
pub mod engine;
pub mod instructor_lock;
pub mod lifecycle;
pub mod recurrence;
pub mod temporal;

// Re-exports
pub use conflict_checker::{ConflictScope, ScheduleConflictChecker};
pub use engine::BookingEngine;
pub use instructor_lock::{InstructorGuard, InstructorLocks};
pub use lifecycle::{
    AppointmentChanges, AppointmentService, AvailabilityChanges, AvailabilityService,
    NewAppointment, NewAvailability, NewUnavailability, UnavailabilityChanges,
    UnavailabilityService,
};
pub use recurrence::RecurrencePolicy;
pub use temporal::TemporalValidator;
