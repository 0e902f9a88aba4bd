// DriveBook Core - Scheduling Domain Logic & Ports
// NO infrastructure dependencies (storage lives behind the port traits)

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use application::BookingEngine;
pub use config::SchedulingConfig;
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
