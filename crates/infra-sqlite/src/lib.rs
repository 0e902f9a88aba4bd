// Drivebook Infrastructure - SQLite Adapter
// Implements: ScheduleRepository, ConflictQueryPort

mod connection;
mod error;
mod migration;
mod schedule_repository;

pub use connection::{create_pool, open_database};
pub use migration::run_migrations;
pub use schedule_repository::SqliteScheduleRepository;
