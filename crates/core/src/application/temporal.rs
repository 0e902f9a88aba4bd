// Temporal Validation
//
// Ordering and non-past-start rules for a raw (start, end) pair.

use crate::domain::{TimeInterval, Timestamp, ValidationError};
use crate::port::TimeProvider;
use std::sync::Arc;

/// Validates raw ranges against the injected clock
pub struct TemporalValidator {
    time_provider: Arc<dyn TimeProvider>,
}

impl TemporalValidator {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    /// Check `end > start` first, then `start >= now`.
    ///
    /// Returns the validated interval on success.
    pub fn validate_range(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<TimeInterval, ValidationError> {
        let interval = TimeInterval::new(start, end)?;

        if start < self.time_provider.now() {
            return Err(ValidationError::PastStart { start });
        }

        Ok(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::FixedTimeProvider;
    use chrono::{Duration, TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn validator() -> TemporalValidator {
        TemporalValidator::new(Arc::new(FixedTimeProvider(now())))
    }

    #[test]
    fn test_rejects_end_not_after_start() {
        let v = validator();
        let start = now() + Duration::days(1);

        for end in [start, start - Duration::minutes(1), start - Duration::days(3)] {
            assert!(matches!(
                v.validate_range(start, end),
                Err(ValidationError::InvalidRange { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_past_start() {
        let v = validator();
        let start = now() - Duration::seconds(1);

        assert_eq!(
            v.validate_range(start, now() + Duration::hours(1)),
            Err(ValidationError::PastStart { start })
        );
    }

    #[test]
    fn test_ordering_is_checked_before_past_start() {
        let v = validator();
        let start = now() - Duration::hours(2);

        assert!(matches!(
            v.validate_range(start, start),
            Err(ValidationError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_accepts_start_at_now() {
        let v = validator();
        let interval = v.validate_range(now(), now() + Duration::hours(1)).unwrap();
        assert_eq!(interval.start(), now());
        assert_eq!(interval.duration(), Duration::hours(1));
    }
}
