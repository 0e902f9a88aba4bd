// Availability lifecycle: create / modify / delete

use super::{ensure_owner, moved_bounds, require_instructor};
use crate::application::conflict_checker::{ConflictScope, ScheduleConflictChecker};
use crate::application::instructor_lock::InstructorLocks;
use crate::application::recurrence::RecurrencePolicy;
use crate::application::temporal::TemporalValidator;
use crate::domain::{
    AvailabilityDraft, AvailabilityId, AvailabilityWindow, InstructorId, RecurrenceRule,
    Timestamp,
};
use crate::error::{AppError, EntityKind, Result};
use crate::port::ScheduleRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Create-availability request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAvailability {
    pub instructor_id: InstructorId,
    pub start: Timestamp,
    pub end: Timestamp,

    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_rule: Option<RecurrenceRule>,
    #[serde(default)]
    pub expiry_date: Option<Timestamp>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityChanges {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub is_recurring: Option<bool>,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub expiry_date: Option<Timestamp>,
    pub note: Option<String>,
}

impl AvailabilityChanges {
    fn touches_recurrence(&self) -> bool {
        self.is_recurring.is_some() || self.recurrence_rule.is_some() || self.expiry_date.is_some()
    }
}

pub struct AvailabilityService {
    repo: Arc<dyn ScheduleRepository>,
    checker: Arc<ScheduleConflictChecker>,
    temporal: Arc<TemporalValidator>,
    recurrence: Arc<RecurrencePolicy>,
    locks: Arc<InstructorLocks>,
}

impl AvailabilityService {
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        checker: Arc<ScheduleConflictChecker>,
        temporal: Arc<TemporalValidator>,
        recurrence: Arc<RecurrencePolicy>,
        locks: Arc<InstructorLocks>,
    ) -> Self {
        Self {
            repo,
            checker,
            temporal,
            recurrence,
            locks,
        }
    }

    /// Validate and store a new availability window
    pub async fn create(&self, req: NewAvailability) -> Result<AvailabilityWindow> {
        let instructor_id = req.instructor_id;
        let _guard = self.locks.acquire(instructor_id).await;

        self.create_locked(req).await.inspect_err(|err| {
            warn!(
                instructor_id = instructor_id,
                error = %err,
                "Availability creation rejected"
            )
        })
    }

    async fn create_locked(&self, req: NewAvailability) -> Result<AvailabilityWindow> {
        require_instructor(self.repo.as_ref(), req.instructor_id).await?;

        let interval = self.temporal.validate_range(req.start, req.end)?;
        let recurrence = self.recurrence.validate(
            req.is_recurring,
            req.recurrence_rule,
            req.expiry_date,
            &interval,
        )?;

        self.checker
            .check_interval(req.instructor_id, &interval, ConflictScope::create())
            .await?;

        let window = self
            .repo
            .insert_availability(&AvailabilityDraft {
                instructor_id: req.instructor_id,
                interval,
                recurrence,
                note: req.note,
            })
            .await?;

        info!(
            availability_id = window.id,
            instructor_id = window.instructor_id,
            interval = %window.interval,
            recurring = window.recurrence.is_recurring(),
            "Availability created"
        );
        Ok(window)
    }

    /// Apply a partial update.
    ///
    /// Range and conflict checks only run when start or end actually moves;
    /// the recurrence policy runs when dates or recurrence fields change.
    pub async fn modify(
        &self,
        instructor_id: InstructorId,
        availability_id: AvailabilityId,
        changes: AvailabilityChanges,
    ) -> Result<AvailabilityWindow> {
        let _guard = self.locks.acquire(instructor_id).await;

        self.modify_locked(instructor_id, availability_id, changes)
            .await
            .inspect_err(|err| {
                warn!(
                    instructor_id = instructor_id,
                    availability_id = availability_id,
                    error = %err,
                    "Availability update rejected"
                )
            })
    }

    async fn modify_locked(
        &self,
        instructor_id: InstructorId,
        availability_id: AvailabilityId,
        changes: AvailabilityChanges,
    ) -> Result<AvailabilityWindow> {
        require_instructor(self.repo.as_ref(), instructor_id).await?;
        let existing = self.find_owned(instructor_id, availability_id).await?;

        let moved = moved_bounds(&existing.interval, changes.start, changes.end);
        let interval = match moved {
            Some((start, end)) => self.temporal.validate_range(start, end)?,
            None => existing.interval,
        };

        let recurrence = if moved.is_some() || changes.touches_recurrence() {
            let is_recurring = changes
                .is_recurring
                .unwrap_or(existing.recurrence.is_recurring());
            let (rule, expiry) = if is_recurring {
                (
                    changes.recurrence_rule.or(existing.recurrence.rule()),
                    changes.expiry_date.or(existing.recurrence.expiry()),
                )
            } else {
                (changes.recurrence_rule, changes.expiry_date)
            };
            self.recurrence
                .validate(is_recurring, rule, expiry, &interval)?
        } else {
            existing.recurrence
        };

        if moved.is_some() {
            self.checker
                .check_interval(
                    instructor_id,
                    &interval,
                    ConflictScope::excluding_availability(availability_id),
                )
                .await?;
        } else {
            debug!(
                availability_id = availability_id,
                "Dates unchanged, skipping conflict scan"
            );
        }

        let updated = AvailabilityWindow {
            interval,
            recurrence,
            note: changes.note.or(existing.note),
            ..existing
        };
        self.repo.update_availability(&updated).await?;

        info!(
            availability_id = availability_id,
            instructor_id = instructor_id,
            interval = %updated.interval,
            "Availability updated"
        );
        Ok(updated)
    }

    /// Delete an owned window; no conflict re-check
    pub async fn delete(
        &self,
        instructor_id: InstructorId,
        availability_id: AvailabilityId,
    ) -> Result<()> {
        let _guard = self.locks.acquire(instructor_id).await;

        require_instructor(self.repo.as_ref(), instructor_id).await?;
        self.find_owned(instructor_id, availability_id).await?;
        self.repo.delete_availability(availability_id).await?;

        info!(
            availability_id = availability_id,
            instructor_id = instructor_id,
            "Availability deleted"
        );
        Ok(())
    }

    async fn find_owned(
        &self,
        instructor_id: InstructorId,
        availability_id: AvailabilityId,
    ) -> Result<AvailabilityWindow> {
        let window = self
            .repo
            .find_availability(availability_id)
            .await?
            .ok_or_else(|| AppError::not_found(EntityKind::Availability, availability_id))?;
        ensure_owner(
            EntityKind::Availability,
            availability_id,
            window.instructor_id,
            instructor_id,
        )?;
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Instructor, Recurrence, TimeInterval, User, ValidationError};
    use crate::port::schedule_repository::mocks::InMemorySchedule;
    use crate::port::schedule_repository::MockScheduleRepository;
    use crate::port::{FixedTimeProvider, TimeProvider};
    use chrono::{Duration, TimeZone, Utc};
    use tokio_test::assert_ok;

    const INSTRUCTOR: InstructorId = 1;
    const OTHER_INSTRUCTOR: InstructorId = 2;
    const STUDENT: i64 = 30;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn at(hour: u32, minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 10, hour, minute, 0).unwrap()
    }

    fn service_with(
        repo: Arc<dyn ScheduleRepository>,
        store: Arc<InMemorySchedule>,
    ) -> AvailabilityService {
        let clock: Arc<dyn TimeProvider> = Arc::new(FixedTimeProvider(now()));
        AvailabilityService::new(
            repo,
            Arc::new(ScheduleConflictChecker::new(store)),
            Arc::new(TemporalValidator::new(clock.clone())),
            Arc::new(RecurrencePolicy::new(clock)),
            Arc::new(InstructorLocks::disabled()),
        )
    }

    fn setup() -> (Arc<InMemorySchedule>, AvailabilityService) {
        let store = Arc::new(InMemorySchedule::new());
        store.add_instructor(INSTRUCTOR);
        store.add_instructor(OTHER_INSTRUCTOR);
        store.add_student(STUDENT);
        let service = service_with(store.clone(), store.clone());
        (store, service)
    }

    fn request(start: Timestamp, end: Timestamp) -> NewAvailability {
        NewAvailability {
            instructor_id: INSTRUCTOR,
            start,
            end,
            is_recurring: false,
            recurrence_rule: None,
            expiry_date: None,
            note: None,
        }
    }

    fn validation_of(result: Result<AvailabilityWindow>) -> ValidationError {
        match result {
            Err(AppError::Validation(v)) => v,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_stores_window() {
        let (store, service) = setup();

        let window = service
            .create(NewAvailability {
                note: Some("Boîte auto".to_string()),
                ..request(at(10, 0), at(12, 0))
            })
            .await
            .unwrap();

        assert_eq!(window.instructor_id, INSTRUCTOR);
        assert_eq!(window.recurrence, Recurrence::Once);
        assert_eq!(window.note.as_deref(), Some("Boîte auto"));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_instructor() {
        let (store, service) = setup();

        for id in [99, STUDENT] {
            let err = service
                .create(NewAvailability {
                    instructor_id: id,
                    ..request(at(10, 0), at(12, 0))
                })
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                AppError::NotFound {
                    entity: EntityKind::Instructor,
                    ..
                }
            ));
        }
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_ranges() {
        let (store, service) = setup();

        let err = validation_of(service.create(request(at(12, 0), at(10, 0))).await);
        assert!(matches!(err, ValidationError::InvalidRange { .. }));

        let past = now() - Duration::days(1);
        let err = validation_of(service.create(request(past, past + Duration::hours(1))).await);
        assert!(matches!(err, ValidationError::PastStart { .. }));

        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_recurring_without_rule_rejected() {
        let (store, service) = setup();

        let err = validation_of(
            service
                .create(NewAvailability {
                    is_recurring: true,
                    expiry_date: Some(at(12, 0) + Duration::days(60)),
                    ..request(at(10, 0), at(12, 0))
                })
                .await,
        );
        assert_eq!(err, ValidationError::RecurrenceRuleRequired);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_expiry_rules() {
        let (_store, service) = setup();

        let err = validation_of(
            service
                .create(NewAvailability {
                    expiry_date: Some(at(12, 0) + Duration::days(7)),
                    ..request(at(10, 0), at(12, 0))
                })
                .await,
        );
        assert_eq!(err, ValidationError::ExpiryNotApplicable);

        let recurring = |expiry| NewAvailability {
            is_recurring: true,
            recurrence_rule: Some(RecurrenceRule::Weekly),
            expiry_date: Some(expiry),
            ..request(at(10, 0), at(12, 0))
        };

        let err = validation_of(service.create(recurring(now() - Duration::days(2))).await);
        assert!(matches!(err, ValidationError::ExpiryInPast { .. }));

        let err = validation_of(service.create(recurring(now() + Duration::days(3))).await);
        assert!(matches!(err, ValidationError::ExpiryBeforeInterval { .. }));

        let window = service
            .create(recurring(at(12, 0) + Duration::days(90)))
            .await
            .unwrap();
        assert!(window.recurrence.is_recurring());
        assert_eq!(window.recurrence.rule(), Some(RecurrenceRule::Weekly));
    }

    #[tokio::test]
    async fn test_create_conflicting_window_rejected() {
        let (store, service) = setup();
        service.create(request(at(10, 0), at(12, 0))).await.unwrap();

        let err = service
            .create(request(at(11, 0), at(13, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.write_count(), 1);

        assert_ok!(service.create(request(at(12, 0), at(13, 0))).await);
    }

    #[tokio::test]
    async fn test_modify_excludes_itself_from_scan() {
        let (_store, service) = setup();
        let window = service.create(request(at(10, 0), at(12, 0))).await.unwrap();

        let updated = service
            .modify(
                INSTRUCTOR,
                window.id,
                AvailabilityChanges {
                    end: Some(at(12, 30)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.interval, TimeInterval::new(at(10, 0), at(12, 30)).unwrap());
    }

    #[tokio::test]
    async fn test_modify_into_other_window_rejected() {
        let (_store, service) = setup();
        service.create(request(at(8, 0), at(9, 0))).await.unwrap();
        let window = service.create(request(at(10, 0), at(12, 0))).await.unwrap();

        let err = service
            .modify(
                INSTRUCTOR,
                window.id,
                AvailabilityChanges {
                    start: Some(at(8, 30)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_modify_note_only_skips_date_checks() {
        let (store, service) = setup();
        // window already in the past relative to the clock
        let past = now() - Duration::days(3);
        store.seed_availability(AvailabilityWindow {
            id: 40,
            instructor_id: INSTRUCTOR,
            interval: TimeInterval::new(past, past + Duration::hours(2)).unwrap(),
            recurrence: Recurrence::Once,
            note: None,
        });

        let updated = service
            .modify(
                INSTRUCTOR,
                40,
                AvailabilityChanges {
                    note: Some("Annulé".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.note.as_deref(), Some("Annulé"));
    }

    #[tokio::test]
    async fn test_modify_switch_to_recurring_requires_rule() {
        let (_store, service) = setup();
        let window = service.create(request(at(10, 0), at(12, 0))).await.unwrap();

        let err = service
            .modify(
                INSTRUCTOR,
                window.id,
                AvailabilityChanges {
                    is_recurring: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::RecurrenceRuleRequired)
        ));
    }

    #[tokio::test]
    async fn test_modify_and_delete_check_ownership() {
        let (store, service) = setup();
        let window = service.create(request(at(10, 0), at(12, 0))).await.unwrap();

        let err = service
            .modify(OTHER_INSTRUCTOR, window.id, AvailabilityChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Ownership { .. }));

        let err = service.delete(OTHER_INSTRUCTOR, window.id).await.unwrap_err();
        assert!(matches!(err, AppError::Ownership { .. }));

        let err = service.delete(INSTRUCTOR, 777).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                entity: EntityKind::Availability,
                id: 777
            }
        ));

        assert_ok!(service.delete(INSTRUCTOR, window.id).await);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_rejected_create_never_writes() {
        let store = Arc::new(InMemorySchedule::new());
        store.seed_availability(AvailabilityWindow {
            id: 1,
            instructor_id: INSTRUCTOR,
            interval: TimeInterval::new(at(10, 0), at(12, 0)).unwrap(),
            recurrence: Recurrence::Once,
            note: None,
        });

        let mut repo = MockScheduleRepository::new();
        repo.expect_find_user().returning(|id| {
            Ok(Some(User::Instructor(Instructor {
                id,
                first_name: "Paul".to_string(),
                last_name: "Durand".to_string(),
                email: "paul@example.com".to_string(),
                siret: "12345678900011".to_string(),
            })))
        });
        repo.expect_insert_availability().never();

        let service = service_with(Arc::new(repo), store);
        let err = service
            .create(request(at(11, 0), at(13, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
