// Domain Error Types

use super::interval::{format_timestamp, Timestamp};
use thiserror::Error;

/// Malformed, out-of-order or past-dated input (caller's fault)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "Invalid range: end {} must be after start {}",
        format_timestamp(.end),
        format_timestamp(.start)
    )]
    InvalidRange { start: Timestamp, end: Timestamp },

    #[error("Start {} is in the past", format_timestamp(.start))]
    PastStart { start: Timestamp },

    #[error("A recurrence rule is required for a recurring availability")]
    RecurrenceRuleRequired,

    #[error("An expiry date only applies to a recurring availability")]
    ExpiryNotApplicable,

    #[error("Expiry date {} is in the past", format_timestamp(.expiry))]
    ExpiryInPast { expiry: Timestamp },

    #[error(
        "Expiry date {} must be after the end of the window {}",
        format_timestamp(.expiry),
        format_timestamp(.interval_end)
    )]
    ExpiryBeforeInterval {
        expiry: Timestamp,
        interval_end: Timestamp,
    },

    #[error("Invalid date: {0:?}")]
    InvalidDate(String),
}
