// User Domain Model
//
// Instructors and students share one id space and are told apart by an
// explicit role tag, never by which optional fields happen to be present.

use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type InstructorId = UserId;
pub type StudentId = UserId;
pub type MeetingPointId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Instructor,
    Student,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Instructor => write!(f, "INSTRUCTOR"),
            UserRole::Student => write!(f, "STUDENT"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSTRUCTOR" => Ok(UserRole::Instructor),
            "STUDENT" => Ok(UserRole::Student),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

/// Driving instructor (registered business, identified by SIRET)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: InstructorId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub siret: String,
}

/// Learner driver (identified by NEPH registration number)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub neph: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum User {
    Instructor(Instructor),
    Student(Student),
}

impl User {
    pub fn id(&self) -> UserId {
        match self {
            User::Instructor(i) => i.id,
            User::Student(s) => s.id,
        }
    }

    pub fn role(&self) -> UserRole {
        match self {
            User::Instructor(_) => UserRole::Instructor,
            User::Student(_) => UserRole::Student,
        }
    }

    pub fn as_instructor(&self) -> Option<&Instructor> {
        match self {
            User::Instructor(i) => Some(i),
            User::Student(_) => None,
        }
    }

    pub fn as_student(&self) -> Option<&Student> {
        match self {
            User::Student(s) => Some(s),
            User::Instructor(_) => None,
        }
    }
}

/// Place where a lesson starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingPoint {
    pub id: MeetingPointId,
    pub name: String,
    pub address: String,
}
