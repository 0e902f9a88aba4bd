// Appointment Domain Model

use super::interval::{TimeInterval, Timestamp};
use super::user::{InstructorId, MeetingPointId, StudentId};
use serde::{Deserialize, Serialize};

/// Appointment ID
pub type AppointmentId = i64;

/// Appointment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Notation,
    Completed,
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "PENDING"),
            AppointmentStatus::Confirmed => write!(f, "CONFIRMED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
            AppointmentStatus::Notation => write!(f, "NOTATION"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AppointmentStatus::Pending),
            "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
            "CANCELLED" => Ok(AppointmentStatus::Cancelled),
            "NOTATION" => Ok(AppointmentStatus::Notation),
            "COMPLETED" => Ok(AppointmentStatus::Completed),
            other => Err(format!("Unknown appointment status: {}", other)),
        }
    }
}

/// Driving lesson booked between an instructor and a student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub instructor_id: InstructorId,
    pub student_id: StudentId,
    pub meeting_point_id: MeetingPointId,
    pub interval: TimeInterval,
    pub status: AppointmentStatus,
    pub is_accepted: bool,
    pub is_valid: bool,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl Appointment {
    /// Only confirmed appointments block other bookings
    pub fn is_confirmed(&self) -> bool {
        self.is_accepted && self.is_valid
    }
}

/// Appointment ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentDraft {
    pub instructor_id: InstructorId,
    pub student_id: StudentId,
    pub meeting_point_id: MeetingPointId,
    pub interval: TimeInterval,
    pub status: AppointmentStatus,
    pub is_accepted: bool,
    pub is_valid: bool,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

impl AppointmentDraft {
    /// New booking request: pending, not yet accepted, valid
    pub fn pending(
        instructor_id: InstructorId,
        student_id: StudentId,
        meeting_point_id: MeetingPointId,
        interval: TimeInterval,
        description: Option<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            instructor_id,
            student_id,
            meeting_point_id,
            interval,
            status: AppointmentStatus::Pending,
            is_accepted: false,
            is_valid: true,
            description,
            created_at,
        }
    }

    pub fn into_appointment(self, id: AppointmentId) -> Appointment {
        Appointment {
            id,
            instructor_id: self.instructor_id,
            student_id: self.student_id,
            meeting_point_id: self.meeting_point_id,
            interval: self.interval,
            status: self.status,
            is_accepted: self.is_accepted,
            is_valid: self.is_valid,
            description: self.description,
            created_at: self.created_at,
            modified_at: self.created_at,
        }
    }
}
