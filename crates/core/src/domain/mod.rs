// Domain Layer - Pure scheduling entities and value types

pub mod appointment;
pub mod availability;
pub mod conflict;
pub mod error;
pub mod interval;
pub mod unavailability;
pub mod user;

// Re-exports
pub use appointment::{Appointment, AppointmentDraft, AppointmentId, AppointmentStatus};
pub use availability::{
    AvailabilityDraft, AvailabilityId, AvailabilityWindow, Recurrence, RecurrenceRule,
};
pub use conflict::{ConflictError, ConflictKind, ConflictingEntry};
pub use error::ValidationError;
pub use interval::{overlaps, TimeInterval, Timestamp};
pub use unavailability::{UnavailabilityDraft, UnavailabilityId, UnavailabilityWindow};
pub use user::{
    Instructor, InstructorId, MeetingPoint, MeetingPointId, Student, StudentId, User, UserId,
    UserRole,
};
