// Appointment lifecycle: create / modify / delete
//
// Date strings are parsed here (RFC 3339); an unparseable value is rejected
// before any lookup result is acted on.

use super::{ensure_owner, moved_bounds, require_instructor};
use crate::application::conflict_checker::{ConflictScope, ScheduleConflictChecker};
use crate::application::instructor_lock::InstructorLocks;
use crate::domain::interval::parse_timestamp;
use crate::domain::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentStatus, InstructorId,
    MeetingPointId, StudentId, TimeInterval,
};
use crate::error::{AppError, EntityKind, Result};
use crate::port::{ScheduleRepository, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Booking request as received from the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub instructor_id: InstructorId,
    pub student_id: StudentId,
    pub meeting_point_id: MeetingPointId,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentChanges {
    pub start: Option<String>,
    pub end: Option<String>,
    pub meeting_point_id: Option<MeetingPointId>,
    pub status: Option<AppointmentStatus>,
    pub is_accepted: Option<bool>,
    pub is_valid: Option<bool>,
    pub description: Option<String>,
}

pub struct AppointmentService {
    repo: Arc<dyn ScheduleRepository>,
    checker: Arc<ScheduleConflictChecker>,
    time_provider: Arc<dyn TimeProvider>,
    locks: Arc<InstructorLocks>,
}

impl AppointmentService {
    pub fn new(
        repo: Arc<dyn ScheduleRepository>,
        checker: Arc<ScheduleConflictChecker>,
        time_provider: Arc<dyn TimeProvider>,
        locks: Arc<InstructorLocks>,
    ) -> Self {
        Self {
            repo,
            checker,
            time_provider,
            locks,
        }
    }

    /// Book a new pending appointment
    pub async fn create(&self, req: NewAppointment) -> Result<Appointment> {
        let instructor_id = req.instructor_id;
        let _guard = self.locks.acquire(instructor_id).await;

        self.create_locked(req).await.inspect_err(|err| {
            warn!(
                instructor_id = instructor_id,
                error = %err,
                "Appointment creation rejected"
            )
        })
    }

    async fn create_locked(&self, req: NewAppointment) -> Result<Appointment> {
        require_instructor(self.repo.as_ref(), req.instructor_id).await?;
        self.require_student(req.student_id).await?;
        self.require_meeting_point(req.meeting_point_id).await?;

        let interval = TimeInterval::new(parse_timestamp(&req.start)?, parse_timestamp(&req.end)?)?;
        self.checker
            .check_interval(req.instructor_id, &interval, ConflictScope::create())
            .await?;

        let appointment = self
            .repo
            .insert_appointment(&AppointmentDraft::pending(
                req.instructor_id,
                req.student_id,
                req.meeting_point_id,
                interval,
                req.description,
                self.time_provider.now(),
            ))
            .await?;

        info!(
            appointment_id = appointment.id,
            instructor_id = appointment.instructor_id,
            student_id = appointment.student_id,
            interval = %appointment.interval,
            "Appointment created"
        );
        Ok(appointment)
    }

    /// Apply a partial update.
    ///
    /// Status, acceptance and description changes never trigger a conflict
    /// scan; a reschedule scans with the appointment itself excluded.
    pub async fn modify(
        &self,
        instructor_id: InstructorId,
        appointment_id: AppointmentId,
        changes: AppointmentChanges,
    ) -> Result<Appointment> {
        let _guard = self.locks.acquire(instructor_id).await;

        self.modify_locked(instructor_id, appointment_id, changes)
            .await
            .inspect_err(|err| {
                warn!(
                    instructor_id = instructor_id,
                    appointment_id = appointment_id,
                    error = %err,
                    "Appointment update rejected"
                )
            })
    }

    async fn modify_locked(
        &self,
        instructor_id: InstructorId,
        appointment_id: AppointmentId,
        changes: AppointmentChanges,
    ) -> Result<Appointment> {
        require_instructor(self.repo.as_ref(), instructor_id).await?;
        let existing = self.find_owned(instructor_id, appointment_id).await?;

        if let Some(meeting_point_id) = changes.meeting_point_id {
            self.require_meeting_point(meeting_point_id).await?;
        }

        let start = changes.start.as_deref().map(parse_timestamp).transpose()?;
        let end = changes.end.as_deref().map(parse_timestamp).transpose()?;

        let interval = match moved_bounds(&existing.interval, start, end) {
            Some((start, end)) => {
                let interval = TimeInterval::new(start, end)?;
                self.checker
                    .check_interval(
                        instructor_id,
                        &interval,
                        ConflictScope::excluding_appointment(appointment_id),
                    )
                    .await?;
                interval
            }
            None => {
                debug!(
                    appointment_id = appointment_id,
                    "Dates unchanged, skipping conflict scan"
                );
                existing.interval
            }
        };

        let updated = Appointment {
            interval,
            meeting_point_id: changes.meeting_point_id.unwrap_or(existing.meeting_point_id),
            status: changes.status.unwrap_or(existing.status),
            is_accepted: changes.is_accepted.unwrap_or(existing.is_accepted),
            is_valid: changes.is_valid.unwrap_or(existing.is_valid),
            description: changes.description.or(existing.description),
            modified_at: self.time_provider.now(),
            ..existing
        };
        self.repo.update_appointment(&updated).await?;

        info!(
            appointment_id = appointment_id,
            instructor_id = instructor_id,
            status = %updated.status,
            confirmed = updated.is_confirmed(),
            "Appointment updated"
        );
        Ok(updated)
    }

    pub async fn delete(
        &self,
        instructor_id: InstructorId,
        appointment_id: AppointmentId,
    ) -> Result<()> {
        let _guard = self.locks.acquire(instructor_id).await;

        require_instructor(self.repo.as_ref(), instructor_id).await?;
        self.find_owned(instructor_id, appointment_id).await?;
        self.repo.delete_appointment(appointment_id).await?;

        info!(
            appointment_id = appointment_id,
            instructor_id = instructor_id,
            "Appointment deleted"
        );
        Ok(())
    }

    async fn require_student(&self, student_id: StudentId) -> Result<()> {
        match self.repo.find_user(student_id).await? {
            Some(user) if user.as_student().is_some() => Ok(()),
            _ => Err(AppError::not_found(EntityKind::Student, student_id)),
        }
    }

    async fn require_meeting_point(&self, meeting_point_id: MeetingPointId) -> Result<()> {
        self.repo
            .find_meeting_point(meeting_point_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(EntityKind::MeetingPoint, meeting_point_id))
    }

    async fn find_owned(
        &self,
        instructor_id: InstructorId,
        appointment_id: AppointmentId,
    ) -> Result<Appointment> {
        let appointment = self
            .repo
            .find_appointment(appointment_id)
            .await?
            .ok_or_else(|| AppError::not_found(EntityKind::Appointment, appointment_id))?;
        ensure_owner(
            EntityKind::Appointment,
            appointment_id,
            appointment.instructor_id,
            instructor_id,
        )?;
        Ok(appointment)
    }
}
