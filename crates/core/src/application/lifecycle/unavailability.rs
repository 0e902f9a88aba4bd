// Unavailability lifecycle: create / modify / delete

use super::{ensure_owner, moved_bounds, require_instructor};
use crate::application::conflict_checker::{ConflictScope, ScheduleConflictChecker};
use crate::application::instructor_lock::InstructorLocks;
use crate::application::temporal::TemporalValidator;
use crate::domain::{
    InstructorId, Timestamp, UnavailabilityDraft, UnavailabilityId, UnavailabilityWindow,
};
use crate::error::{AppError, EntityKind, Result};
use crate::port::ScheduleRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Create-unavailability request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUnavailability {
    pub instructor_id: InstructorId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub reason: String,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnavailabilityChanges {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub reason: Option<String>,
}

pub struct UnavailabilityService {
    repo: Arc<dyn ScheduleRepository>,
    checker: Arc<ScheduleConflictChecker>,
    temporal: Arc<TemporalValidator>,
    locks: Arc<InstructorLocks>,
}

impl UnavailabilityService {
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        checker: Arc<ScheduleConflictChecker>,
        temporal: Arc<TemporalValidator>,
        locks: Arc<InstructorLocks>,
    ) -> Self {
        Self {
            repo,
            checker,
            temporal,
            locks,
        }
    }

    pub async fn create(&self, req: NewUnavailability) -> Result<UnavailabilityWindow> {
        let instructor_id = req.instructor_id;
        let _guard = self.locks.acquire(instructor_id).await;

        self.create_locked(req).await.inspect_err(|err| {
            warn!(
                instructor_id = instructor_id,
                error = %err,
                "Unavailability creation rejected"
            )
        })
    }

    async fn create_locked(&self, req: NewUnavailability) -> Result<UnavailabilityWindow> {
        require_instructor(self.repo.as_ref(), req.instructor_id).await?;

        let interval = self.temporal.validate_range(req.start, req.end)?;
        self.checker
            .check_interval(req.instructor_id, &interval, ConflictScope::create())
            .await?;

        let window = self
            .repo
            .insert_unavailability(&UnavailabilityDraft {
                instructor_id: req.instructor_id,
                interval,
                reason: req.reason,
            })
            .await?;

        info!(
            unavailability_id = window.id,
            instructor_id = window.instructor_id,
            interval = %window.interval,
            "Unavailability created"
        );
        Ok(window)
    }

    pub async fn modify(
        &self,
        instructor_id: InstructorId,
        unavailability_id: UnavailabilityId,
        changes: UnavailabilityChanges,
    ) -> Result<UnavailabilityWindow> {
        let _guard = self.locks.acquire(instructor_id).await;

        self.modify_locked(instructor_id, unavailability_id, changes)
            .await
            .inspect_err(|err| {
                warn!(
                    instructor_id = instructor_id,
                    unavailability_id = unavailability_id,
                    error = %err,
                    "Unavailability update rejected"
                )
            })
    }

    async fn modify_locked(
        &self,
        instructor_id: InstructorId,
        unavailability_id: UnavailabilityId,
        changes: UnavailabilityChanges,
    ) -> Result<UnavailabilityWindow> {
        require_instructor(self.repo.as_ref(), instructor_id).await?;
        let existing = self.find_owned(instructor_id, unavailability_id).await?;

        let interval = match moved_bounds(&existing.interval, changes.start, changes.end) {
            Some((start, end)) => {
                let interval = self.temporal.validate_range(start, end)?;
                self.checker
                    .check_interval(
                        instructor_id,
                        &interval,
                        ConflictScope::excluding_unavailability(unavailability_id),
                    )
                    .await?;
                interval
            }
            None => {
                debug!(
                    unavailability_id = unavailability_id,
                    "Dates unchanged, skipping conflict scan"
                );
                existing.interval
            }
        };

        let updated = UnavailabilityWindow {
            interval,
            reason: changes.reason.unwrap_or(existing.reason),
            ..existing
        };
        self.repo.update_unavailability(&updated).await?;

        info!(
            unavailability_id = unavailability_id,
            instructor_id = instructor_id,
            interval = %updated.interval,
            "Unavailability updated"
        );
        Ok(updated)
    }

    pub async fn delete(
        &self,
        instructor_id: InstructorId,
        unavailability_id: UnavailabilityId,
    ) -> Result<()> {
        let _guard = self.locks.acquire(instructor_id).await;

        require_instructor(self.repo.as_ref(), instructor_id).await?;
        self.find_owned(instructor_id, unavailability_id).await?;
        self.repo.delete_unavailability(unavailability_id).await?;

        info!(
            unavailability_id = unavailability_id,
            instructor_id = instructor_id,
            "Unavailability deleted"
        );
        Ok(())
    }

    async fn find_owned(
        &self,
        instructor_id: InstructorId,
        unavailability_id: UnavailabilityId,
    ) -> Result<UnavailabilityWindow> {
        let window = self
            .repo
            .find_unavailability(unavailability_id)
            .await?
            .ok_or_else(|| AppError::not_found(EntityKind::Unavailability, unavailability_id))?;
        ensure_owner(
            EntityKind::Unavailability,
            unavailability_id,
            window.instructor_id,
            instructor_id,
        )?;
        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AvailabilityWindow, ConflictKind, Recurrence, TimeInterval};
    use crate::port::schedule_repository::mocks::InMemorySchedule;
    use crate::port::FixedTimeProvider;
    use chrono::{TimeZone, Utc};

    const INSTRUCTOR: InstructorId = 1;
    const OTHER_INSTRUCTOR: InstructorId = 2;

    fn at(hour: u32, minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 10, hour, minute, 0).unwrap()
    }

    fn setup() -> (Arc<InMemorySchedule>, UnavailabilityService) {
        let store = Arc::new(InMemorySchedule::new());
        store.add_instructor(INSTRUCTOR);
        store.add_instructor(OTHER_INSTRUCTOR);

        let clock = Arc::new(FixedTimeProvider(
            Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        ));
        let service = UnavailabilityService::new(
            store.clone(),
            Arc::new(ScheduleConflictChecker::new(store.clone())),
            Arc::new(TemporalValidator::new(clock)),
            Arc::new(InstructorLocks::disabled()),
        );
        (store, service)
    }

    fn request(start: Timestamp, end: Timestamp) -> NewUnavailability {
        NewUnavailability {
            instructor_id: INSTRUCTOR,
            start,
            end,
            reason: "Examen".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_blocked_by_availability() {
        let (store, service) = setup();
        store.seed_availability(AvailabilityWindow {
            id: 3,
            instructor_id: INSTRUCTOR,
            interval: TimeInterval::new(at(9, 0), at(11, 0)).unwrap(),
            recurrence: Recurrence::Once,
            note: None,
        });

        match service.create(request(at(10, 0), at(12, 0))).await {
            Err(AppError::Conflict(c)) => {
                assert_eq!(c.kind(), ConflictKind::Availability);
                assert_eq!(c.entries()[0].id, 3);
            }
            other => panic!("expected availability conflict, got {:?}", other),
        }
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_modify_excludes_itself_but_not_others() {
        let (_store, service) = setup();
        let first = service.create(request(at(8, 0), at(9, 0))).await.unwrap();
        let second = service.create(request(at(10, 0), at(12, 0))).await.unwrap();

        let moved = service
            .modify(
                INSTRUCTOR,
                second.id,
                UnavailabilityChanges {
                    start: Some(at(9, 0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.interval.start(), at(9, 0));
        assert_eq!(moved.reason, "Examen");

        let err = service
            .modify(
                INSTRUCTOR,
                first.id,
                UnavailabilityChanges {
                    end: Some(at(9, 30)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reason_only_update() {
        let (_store, service) = setup();
        let window = service.create(request(at(10, 0), at(12, 0))).await.unwrap();

        let updated = service
            .modify(
                INSTRUCTOR,
                window.id,
                UnavailabilityChanges {
                    reason: Some("Congés".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.reason, "Congés");
        assert_eq!(updated.interval, window.interval);
    }

    #[tokio::test]
    async fn test_ownership_is_distinct_from_not_found() {
        let (_store, service) = setup();
        let window = service.create(request(at(10, 0), at(12, 0))).await.unwrap();

        let err = service.delete(OTHER_INSTRUCTOR, window.id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Ownership {
                entity: EntityKind::Unavailability,
                ..
            }
        ));

        let err = service.delete(INSTRUCTOR, window.id + 100).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound {
                entity: EntityKind::Unavailability,
                ..
            }
        ));

        service.delete(INSTRUCTOR, window.id).await.unwrap();
    }
}
