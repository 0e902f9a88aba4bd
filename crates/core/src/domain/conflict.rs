// Conflict Error Types
//
// Categories are reported in a fixed priority order: availability,
// unavailability, appointment. Only the first non-empty category is raised.

use super::interval::TimeInterval;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delimiter between conflicting entries in rendered messages
pub const CONFLICT_DELIMITER: &str = ", ";

/// Which collection produced the conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    Availability,
    Unavailability,
    Appointment,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::Availability => write!(f, "AVAILABILITY"),
            ConflictKind::Unavailability => write!(f, "UNAVAILABILITY"),
            ConflictKind::Appointment => write!(f, "APPOINTMENT"),
        }
    }
}

/// One stored interval that collides with the proposed one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingEntry {
    pub id: i64,
    pub interval: TimeInterval,
}

impl std::fmt::Display for ConflictingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.interval.fmt(f)
    }
}

/// Render entries in read order, joined by [`CONFLICT_DELIMITER`]
pub fn describe_entries(entries: &[ConflictingEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(CONFLICT_DELIMITER)
}

/// Valid input that collides with existing schedule state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    #[error("Conflicts with existing availability: {}", describe_entries(.0))]
    Availability(Vec<ConflictingEntry>),

    #[error("Conflicts with existing unavailability: {}", describe_entries(.0))]
    Unavailability(Vec<ConflictingEntry>),

    #[error("Conflicts with confirmed appointment: {}", describe_entries(.0))]
    Appointment(Vec<ConflictingEntry>),
}

impl ConflictError {
    pub fn new(kind: ConflictKind, entries: Vec<ConflictingEntry>) -> Self {
        match kind {
            ConflictKind::Availability => ConflictError::Availability(entries),
            ConflictKind::Unavailability => ConflictError::Unavailability(entries),
            ConflictKind::Appointment => ConflictError::Appointment(entries),
        }
    }

    pub fn kind(&self) -> ConflictKind {
        match self {
            ConflictError::Availability(_) => ConflictKind::Availability,
            ConflictError::Unavailability(_) => ConflictKind::Unavailability,
            ConflictError::Appointment(_) => ConflictKind::Appointment,
        }
    }

    pub fn entries(&self) -> &[ConflictingEntry] {
        match self {
            ConflictError::Availability(entries)
            | ConflictError::Unavailability(entries)
            | ConflictError::Appointment(entries) => entries,
        }
    }
}
