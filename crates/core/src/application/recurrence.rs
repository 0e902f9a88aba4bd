// Recurrence Policy for availability windows
//
// Check order is fixed:
// 1. recurring without rule
// 2. expiry on a non-recurring window
// 3. expiry in the past
// 4. expiry not after the window end

use crate::domain::{Recurrence, RecurrenceRule, TimeInterval, Timestamp, ValidationError};
use crate::port::TimeProvider;
use std::sync::Arc;

pub struct RecurrencePolicy {
    time_provider: Arc<dyn TimeProvider>,
}

impl RecurrencePolicy {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    /// Validate recurrence settings against an already valid interval.
    ///
    /// A rule supplied for a non-recurring window is dropped.
    pub fn validate(
        &self,
        is_recurring: bool,
        recurrence_rule: Option<RecurrenceRule>,
        expiry_date: Option<Timestamp>,
        interval: &TimeInterval,
    ) -> Result<Recurrence, ValidationError> {
        let rule = match (is_recurring, recurrence_rule) {
            (true, None) => return Err(ValidationError::RecurrenceRuleRequired),
            (true, Some(rule)) => rule,
            (false, _) => {
                if expiry_date.is_some() {
                    return Err(ValidationError::ExpiryNotApplicable);
                }
                return Ok(Recurrence::Once);
            }
        };

        if let Some(expiry) = expiry_date {
            if expiry <= self.time_provider.now() {
                return Err(ValidationError::ExpiryInPast { expiry });
            }
            if expiry <= interval.end() {
                return Err(ValidationError::ExpiryBeforeInterval {
                    expiry,
                    interval_end: interval.end(),
                });
            }
        }

        Ok(Recurrence::Repeating {
            rule,
            expiry: expiry_date,
        })
    }

    /// Same as [`validate`](Self::validate) from a raw (start, end) pair
    pub fn validate_window(
        &self,
        is_recurring: bool,
        recurrence_rule: Option<RecurrenceRule>,
        expiry_date: Option<Timestamp>,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Recurrence, ValidationError> {
        let interval = TimeInterval::new(start, end)?;
        self.validate(is_recurring, recurrence_rule, expiry_date, &interval)
    }
}
