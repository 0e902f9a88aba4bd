// Port Layer - Interfaces for external dependencies

pub mod conflict_query;
pub mod schedule_repository;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use conflict_query::{ConflictQueryPort, IntervalRecord};
pub use schedule_repository::ScheduleRepository;
pub use time_provider::{FixedTimeProvider, SystemTimeProvider, TimeProvider};
