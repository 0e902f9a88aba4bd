// Time Provider Port (for testability)

use crate::domain::Timestamp;

/// Time provider interface (allows a fixed "now" in tests)
pub trait TimeProvider: Send + Sync {
    /// Current instant, UTC
    fn now(&self) -> Timestamp;
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeProvider(pub Timestamp);

impl TimeProvider for FixedTimeProvider {
    fn now(&self) -> Timestamp {
        self.0
    }
}
