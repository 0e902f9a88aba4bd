// Availability Window Domain Model

use super::interval::{TimeInterval, Timestamp};
use super::user::InstructorId;
use serde::{Deserialize, Serialize};

/// Availability ID
pub type AvailabilityId = i64;

/// Repetition rule for a recurring availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrenceRule {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl std::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecurrenceRule::Daily => write!(f, "DAILY"),
            RecurrenceRule::Weekly => write!(f, "WEEKLY"),
            RecurrenceRule::Monthly => write!(f, "MONTHLY"),
            RecurrenceRule::Yearly => write!(f, "YEARLY"),
        }
    }
}

impl std::str::FromStr for RecurrenceRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAILY" => Ok(RecurrenceRule::Daily),
            "WEEKLY" => Ok(RecurrenceRule::Weekly),
            "MONTHLY" => Ok(RecurrenceRule::Monthly),
            "YEARLY" => Ok(RecurrenceRule::Yearly),
            other => Err(format!("Unknown recurrence rule: {}", other)),
        }
    }
}

/// Validated recurrence settings of a window.
///
/// Produced by `RecurrencePolicy`; a rule exists iff the window repeats and an
/// expiry only exists alongside a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    Once,
    Repeating {
        rule: RecurrenceRule,
        expiry: Option<Timestamp>,
    },
}

impl Recurrence {
    pub fn is_recurring(&self) -> bool {
        matches!(self, Recurrence::Repeating { .. })
    }

    pub fn rule(&self) -> Option<RecurrenceRule> {
        match self {
            Recurrence::Once => None,
            Recurrence::Repeating { rule, .. } => Some(*rule),
        }
    }

    pub fn expiry(&self) -> Option<Timestamp> {
        match self {
            Recurrence::Once => None,
            Recurrence::Repeating { expiry, .. } => *expiry,
        }
    }
}

/// Availability window entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: AvailabilityId,
    pub instructor_id: InstructorId,
    pub interval: TimeInterval,
    pub recurrence: Recurrence,
    pub note: Option<String>,
}

/// Availability ready to be stored (id assigned by the repository)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityDraft {
    pub instructor_id: InstructorId,
    pub interval: TimeInterval,
    pub recurrence: Recurrence,
    pub note: Option<String>,
}

impl AvailabilityDraft {
    pub fn into_window(self, id: AvailabilityId) -> AvailabilityWindow {
        AvailabilityWindow {
            id,
            instructor_id: self.instructor_id,
            interval: self.interval,
            recurrence: self.recurrence,
            note: self.note,
        }
    }
}
