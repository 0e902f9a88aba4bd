// Unavailability Window Domain Model

use super::interval::TimeInterval;
use super::user::InstructorId;
use serde::{Deserialize, Serialize};

/// Unavailability ID
pub type UnavailabilityId = i64;

/// Block of time an instructor cannot teach
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailabilityWindow {
    pub id: UnavailabilityId,
    pub instructor_id: InstructorId,
    pub interval: TimeInterval,
    pub reason: String,
}

/// Unavailability ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnavailabilityDraft {
    pub instructor_id: InstructorId,
    pub interval: TimeInterval,
    pub reason: String,
}

impl UnavailabilityDraft {
    pub fn into_window(self, id: UnavailabilityId) -> UnavailabilityWindow {
        UnavailabilityWindow {
            id,
            instructor_id: self.instructor_id,
            interval: self.interval,
            reason: self.reason,
        }
    }
}
