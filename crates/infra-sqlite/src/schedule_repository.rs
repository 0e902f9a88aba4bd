// SQLite ScheduleRepository + ConflictQueryPort Implementation
//
// Timestamps are stored as epoch nanoseconds so stored instants compare
// exactly like the domain values; the overlap predicate
// `start_ns < :end AND end_ns > :start` matches the half-open domain rule.

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use chrono::DateTime;
use drivebook_core::domain::interval::format_timestamp;
use drivebook_core::domain::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentStatus, AvailabilityDraft,
    AvailabilityId, AvailabilityWindow, Instructor, InstructorId, MeetingPoint, MeetingPointId,
    Recurrence, RecurrenceRule, Student, TimeInterval, Timestamp, UnavailabilityDraft,
    UnavailabilityId, UnavailabilityWindow, User, UserId,
};
use drivebook_core::error::{AppError, EntityKind, Result};
use drivebook_core::port::{ConflictQueryPort, IntervalRecord, ScheduleRepository};
use sqlx::SqlitePool;
use tracing::debug;

pub struct SqliteScheduleRepository {
    pool: SqlitePool,
}

impl SqliteScheduleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register an instructor or student (directory data is managed elsewhere)
    pub async fn insert_user(&self, user: &User) -> Result<()> {
        let (first_name, last_name, email, siret, neph) = match user {
            User::Instructor(i) => (&i.first_name, &i.last_name, &i.email, Some(&i.siret), None),
            User::Student(s) => (&s.first_name, &s.last_name, &s.email, None, Some(&s.neph)),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, role, first_name, last_name, email, siret, neph)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id())
        .bind(user.role().to_string())
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(siret)
        .bind(neph)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    pub async fn insert_meeting_point(&self, point: &MeetingPoint) -> Result<()> {
        sqlx::query("INSERT INTO meeting_points (id, name, address) VALUES (?, ?, ?)")
            .bind(point.id)
            .bind(&point.name)
            .bind(&point.address)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn overlapping(
        &self,
        sql: &str,
        instructor_id: InstructorId,
        interval: &TimeInterval,
        exclude_id: Option<i64>,
    ) -> Result<Vec<IntervalRecord>> {
        let rows = sqlx::query_as::<_, IntervalRow>(sql)
            .bind(instructor_id)
            .bind(nanos(&interval.end())?)
            .bind(nanos(&interval.start())?)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(IntervalRow::into_record).collect()
    }

    /// Fail with NotFound when a write touched no row
    fn expect_row(affected: u64, entity: EntityKind, id: i64) -> Result<()> {
        if affected == 0 {
            return Err(AppError::not_found(entity, id));
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleRepository for SqliteScheduleRepository {
    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_meeting_point(&self, id: MeetingPointId) -> Result<Option<MeetingPoint>> {
        let row = sqlx::query_as::<_, MeetingPointRow>("SELECT * FROM meeting_points WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| MeetingPoint {
            id: r.id,
            name: r.name,
            address: r.address,
        }))
    }

    async fn find_availability(&self, id: AvailabilityId) -> Result<Option<AvailabilityWindow>> {
        let row = sqlx::query_as::<_, AvailabilityRow>("SELECT * FROM availabilities WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(AvailabilityRow::into_window).transpose()
    }

    async fn insert_availability(&self, draft: &AvailabilityDraft) -> Result<AvailabilityWindow> {
        let result = sqlx::query(
            r#"
            INSERT INTO availabilities (
                instructor_id, start_ns, end_ns, is_recurring, recurrence_rule, expiry_ns, note
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.instructor_id)
        .bind(nanos(&draft.interval.start())?)
        .bind(nanos(&draft.interval.end())?)
        .bind(draft.recurrence.is_recurring())
        .bind(draft.recurrence.rule().map(|r| r.to_string()))
        .bind(draft.recurrence.expiry().as_ref().map(nanos).transpose()?)
        .bind(&draft.note)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let id = result.last_insert_rowid();
        debug!(availability_id = id, "Availability row inserted");
        Ok(draft.clone().into_window(id))
    }

    async fn update_availability(&self, window: &AvailabilityWindow) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE availabilities
            SET start_ns = ?, end_ns = ?, is_recurring = ?, recurrence_rule = ?,
                expiry_ns = ?, note = ?
            WHERE id = ?
            "#,
        )
        .bind(nanos(&window.interval.start())?)
        .bind(nanos(&window.interval.end())?)
        .bind(window.recurrence.is_recurring())
        .bind(window.recurrence.rule().map(|r| r.to_string()))
        .bind(window.recurrence.expiry().as_ref().map(nanos).transpose()?)
        .bind(&window.note)
        .bind(window.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Self::expect_row(result.rows_affected(), EntityKind::Availability, window.id)
    }

    async fn delete_availability(&self, id: AvailabilityId) -> Result<()> {
        let result = sqlx::query("DELETE FROM availabilities WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Self::expect_row(result.rows_affected(), EntityKind::Availability, id)
    }

    async fn find_unavailability(
        &self,
        id: UnavailabilityId,
    ) -> Result<Option<UnavailabilityWindow>> {
        let row =
            sqlx::query_as::<_, UnavailabilityRow>("SELECT * FROM unavailabilities WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        row.map(UnavailabilityRow::into_window).transpose()
    }

    async fn insert_unavailability(
        &self,
        draft: &UnavailabilityDraft,
    ) -> Result<UnavailabilityWindow> {
        let result = sqlx::query(
            "INSERT INTO unavailabilities (instructor_id, start_ns, end_ns, reason) VALUES (?, ?, ?, ?)",
        )
        .bind(draft.instructor_id)
        .bind(nanos(&draft.interval.start())?)
        .bind(nanos(&draft.interval.end())?)
        .bind(&draft.reason)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let id = result.last_insert_rowid();
        debug!(unavailability_id = id, "Unavailability row inserted");
        Ok(draft.clone().into_window(id))
    }

    async fn update_unavailability(&self, window: &UnavailabilityWindow) -> Result<()> {
        let result = sqlx::query(
            "UPDATE unavailabilities SET start_ns = ?, end_ns = ?, reason = ? WHERE id = ?",
        )
        .bind(nanos(&window.interval.start())?)
        .bind(nanos(&window.interval.end())?)
        .bind(&window.reason)
        .bind(window.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Self::expect_row(result.rows_affected(), EntityKind::Unavailability, window.id)
    }

    async fn delete_unavailability(&self, id: UnavailabilityId) -> Result<()> {
        let result = sqlx::query("DELETE FROM unavailabilities WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Self::expect_row(result.rows_affected(), EntityKind::Unavailability, id)
    }

    async fn find_appointment(&self, id: AppointmentId) -> Result<Option<Appointment>> {
        let row = sqlx::query_as::<_, AppointmentRow>("SELECT * FROM appointments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(AppointmentRow::into_appointment).transpose()
    }

    async fn insert_appointment(&self, draft: &AppointmentDraft) -> Result<Appointment> {
        let created_ns = nanos(&draft.created_at)?;

        let result = sqlx::query(
            r#"
            INSERT INTO appointments (
                instructor_id, student_id, meeting_point_id, start_ns, end_ns,
                status, is_accepted, is_valid, description, created_ns, modified_ns
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.instructor_id)
        .bind(draft.student_id)
        .bind(draft.meeting_point_id)
        .bind(nanos(&draft.interval.start())?)
        .bind(nanos(&draft.interval.end())?)
        .bind(draft.status.to_string())
        .bind(draft.is_accepted)
        .bind(draft.is_valid)
        .bind(&draft.description)
        .bind(created_ns)
        .bind(created_ns)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let id = result.last_insert_rowid();
        debug!(appointment_id = id, "Appointment row inserted");
        Ok(draft.clone().into_appointment(id))
    }

    async fn update_appointment(&self, appointment: &Appointment) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE appointments
            SET meeting_point_id = ?, start_ns = ?, end_ns = ?, status = ?,
                is_accepted = ?, is_valid = ?, description = ?, modified_ns = ?
            WHERE id = ?
            "#,
        )
        .bind(appointment.meeting_point_id)
        .bind(nanos(&appointment.interval.start())?)
        .bind(nanos(&appointment.interval.end())?)
        .bind(appointment.status.to_string())
        .bind(appointment.is_accepted)
        .bind(appointment.is_valid)
        .bind(&appointment.description)
        .bind(nanos(&appointment.modified_at)?)
        .bind(appointment.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Self::expect_row(result.rows_affected(), EntityKind::Appointment, appointment.id)
    }

    async fn delete_appointment(&self, id: AppointmentId) -> Result<()> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Self::expect_row(result.rows_affected(), EntityKind::Appointment, id)
    }
}

#[async_trait]
impl ConflictQueryPort for SqliteScheduleRepository {
    async fn find_availabilities(
        &self,
        instructor_id: InstructorId,
        overlapping: &TimeInterval,
        exclude_id: Option<AvailabilityId>,
    ) -> Result<Vec<IntervalRecord>> {
        self.overlapping(
            r#"
            SELECT id, start_ns, end_ns FROM availabilities
            WHERE instructor_id = ? AND start_ns < ? AND end_ns > ?
              AND (? IS NULL OR id <> ?)
            ORDER BY id
            "#,
            instructor_id,
            overlapping,
            exclude_id,
        )
        .await
    }

    async fn find_unavailabilities(
        &self,
        instructor_id: InstructorId,
        overlapping: &TimeInterval,
        exclude_id: Option<UnavailabilityId>,
    ) -> Result<Vec<IntervalRecord>> {
        self.overlapping(
            r#"
            SELECT id, start_ns, end_ns FROM unavailabilities
            WHERE instructor_id = ? AND start_ns < ? AND end_ns > ?
              AND (? IS NULL OR id <> ?)
            ORDER BY id
            "#,
            instructor_id,
            overlapping,
            exclude_id,
        )
        .await
    }

    async fn find_confirmed_appointments(
        &self,
        instructor_id: InstructorId,
        overlapping: &TimeInterval,
    ) -> Result<Vec<IntervalRecord>> {
        self.overlapping(
            r#"
            SELECT id, start_ns, end_ns FROM appointments
            WHERE instructor_id = ? AND start_ns < ? AND end_ns > ?
              AND (? IS NULL OR id <> ?)
              AND is_accepted = 1 AND is_valid = 1
            ORDER BY id
            "#,
            instructor_id,
            overlapping,
            None,
        )
        .await
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn nanos(ts: &Timestamp) -> Result<i64> {
    ts.timestamp_nanos_opt().ok_or_else(|| {
        AppError::Database(format!(
            "Timestamp outside storable range: {}",
            format_timestamp(ts)
        ))
    })
}

fn timestamp(ns: i64) -> Timestamp {
    DateTime::from_timestamp_nanos(ns)
}

fn interval(start_ns: i64, end_ns: i64) -> Result<TimeInterval> {
    TimeInterval::new(timestamp(start_ns), timestamp(end_ns))
        .map_err(|e| AppError::Internal(format!("Corrupt stored interval: {}", e)))
}

#[derive(Debug, sqlx::FromRow)]
struct IntervalRow {
    id: i64,
    start_ns: i64,
    end_ns: i64,
}

impl IntervalRow {
    fn into_record(self) -> Result<IntervalRecord> {
        Ok(IntervalRecord {
            id: self.id,
            interval: interval(self.start_ns, self.end_ns)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    role: String,
    first_name: String,
    last_name: String,
    email: String,
    siret: Option<String>,
    neph: Option<String>,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        match (self.role.as_str(), self.siret, self.neph) {
            ("INSTRUCTOR", Some(siret), _) => Ok(User::Instructor(Instructor {
                id: self.id,
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                siret,
            })),
            ("STUDENT", _, Some(neph)) => Ok(User::Student(Student {
                id: self.id,
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                neph,
            })),
            (role, _, _) => Err(AppError::Internal(format!(
                "User {} has inconsistent role {}",
                self.id, role
            ))),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MeetingPointRow {
    id: i64,
    name: String,
    address: String,
}

#[derive(Debug, sqlx::FromRow)]
struct AvailabilityRow {
    id: i64,
    instructor_id: i64,
    start_ns: i64,
    end_ns: i64,
    is_recurring: bool,
    recurrence_rule: Option<String>,
    expiry_ns: Option<i64>,
    note: Option<String>,
}

impl AvailabilityRow {
    fn into_window(self) -> Result<AvailabilityWindow> {
        let recurrence = match (self.is_recurring, self.recurrence_rule) {
            (false, _) => Recurrence::Once,
            (true, Some(rule)) => Recurrence::Repeating {
                rule: rule.parse::<RecurrenceRule>().map_err(AppError::Internal)?,
                expiry: self.expiry_ns.map(timestamp),
            },
            (true, None) => {
                return Err(AppError::Internal(format!(
                    "Recurring availability {} has no rule",
                    self.id
                )))
            }
        };

        Ok(AvailabilityWindow {
            id: self.id,
            instructor_id: self.instructor_id,
            interval: interval(self.start_ns, self.end_ns)?,
            recurrence,
            note: self.note,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UnavailabilityRow {
    id: i64,
    instructor_id: i64,
    start_ns: i64,
    end_ns: i64,
    reason: String,
}

impl UnavailabilityRow {
    fn into_window(self) -> Result<UnavailabilityWindow> {
        Ok(UnavailabilityWindow {
            id: self.id,
            instructor_id: self.instructor_id,
            interval: interval(self.start_ns, self.end_ns)?,
            reason: self.reason,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: i64,
    instructor_id: i64,
    student_id: i64,
    meeting_point_id: i64,
    start_ns: i64,
    end_ns: i64,
    status: String,
    is_accepted: bool,
    is_valid: bool,
    description: Option<String>,
    created_ns: i64,
    modified_ns: i64,
}

impl AppointmentRow {
    fn into_appointment(self) -> Result<Appointment> {
        Ok(Appointment {
            id: self.id,
            instructor_id: self.instructor_id,
            student_id: self.student_id,
            meeting_point_id: self.meeting_point_id,
            interval: interval(self.start_ns, self.end_ns)?,
            status: self
                .status
                .parse::<AppointmentStatus>()
                .map_err(AppError::Internal)?,
            is_accepted: self.is_accepted,
            is_valid: self.is_valid,
            description: self.description,
            created_at: timestamp(self.created_ns),
            modified_at: timestamp(self.modified_ns),
        })
    }
}
