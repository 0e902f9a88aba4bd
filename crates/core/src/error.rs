// Central Error Type for the Scheduling Core

use crate::domain::conflict::describe_entries;
use crate::domain::{ConflictError, ConflictKind, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Entity kinds referenced by not-found and ownership errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Instructor,
    Student,
    MeetingPoint,
    Availability,
    Unavailability,
    Appointment,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Instructor => write!(f, "Instructor"),
            EntityKind::Student => write!(f, "Student"),
            EntityKind::MeetingPoint => write!(f, "Meeting point"),
            EntityKind::Availability => write!(f, "Availability"),
            EntityKind::Unavailability => write!(f, "Unavailability"),
            EntityKind::Appointment => write!(f, "Appointment"),
        }
    }
}

/// Error taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Ownership,
    Infrastructure,
}

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: i64 },

    #[error("{entity} {id} does not belong to instructor {instructor_id}")]
    Ownership {
        entity: EntityKind,
        id: i64,
        instructor_id: i64,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn not_found(entity: EntityKind, id: i64) -> Self {
        AppError::NotFound { entity, id }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Validation(_) => ErrorCategory::Validation,
            AppError::Conflict(_) => ErrorCategory::Conflict,
            AppError::NotFound { .. } => ErrorCategory::NotFound,
            AppError::Ownership { .. } => ErrorCategory::Ownership,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                ErrorCategory::Infrastructure
            }
        }
    }

    /// Instructor-facing message in the requested language
    pub fn localized(&self, locale: Locale) -> String {
        match locale {
            Locale::En => self.to_string(),
            Locale::Fr => self.to_french(),
        }
    }

    fn to_french(&self) -> String {
        use crate::domain::interval::format_timestamp as ts;

        match self {
            AppError::Validation(v) => match v {
                ValidationError::InvalidRange { .. } => {
                    "La date de fin doit être postérieure à la date de début.".to_string()
                }
                ValidationError::PastStart { .. } => {
                    "La date de début ne peut pas être dans le passé.".to_string()
                }
                ValidationError::RecurrenceRuleRequired => {
                    "Une règle de récurrence est requise pour une disponibilité récurrente."
                        .to_string()
                }
                ValidationError::ExpiryNotApplicable => {
                    "Une date d'expiration ne peut être définie que pour une disponibilité récurrente."
                        .to_string()
                }
                ValidationError::ExpiryInPast { expiry } => {
                    format!("La date d'expiration {} est dans le passé.", ts(expiry))
                }
                ValidationError::ExpiryBeforeInterval { expiry, .. } => format!(
                    "La date d'expiration {} doit être postérieure à la fin du créneau.",
                    ts(expiry)
                ),
                ValidationError::InvalidDate(raw) => format!("Date invalide : {}", raw),
            },
            AppError::Conflict(c) => {
                let label = match c.kind() {
                    ConflictKind::Availability => "des disponibilités existantes",
                    ConflictKind::Unavailability => "des indisponibilités existantes",
                    ConflictKind::Appointment => "des rendez-vous confirmés",
                };
                format!(
                    "Ce créneau chevauche {} : {}",
                    label,
                    describe_entries(c.entries())
                )
            }
            AppError::NotFound { entity, id } => {
                format!("{} introuvable (id {}).", entity_fr(*entity), id)
            }
            AppError::Ownership { entity, id, .. } => format!(
                "{} (id {}) n'appartient pas à ce moniteur.",
                entity_fr(*entity),
                id
            ),
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                "Une erreur interne est survenue.".to_string()
            }
        }
    }
}

fn entity_fr(entity: EntityKind) -> &'static str {
    match entity {
        EntityKind::Instructor => "Moniteur",
        EntityKind::Student => "Élève",
        EntityKind::MeetingPoint => "Point de rendez-vous",
        EntityKind::Availability => "Disponibilité",
        EntityKind::Unavailability => "Indisponibilité",
        EntityKind::Appointment => "Rendez-vous",
    }
}

/// Message language for instructor-facing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Fr,
    En,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Fr => "fr",
            Locale::En => "en",
        }
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lang = s.trim().to_lowercase();
        if lang.starts_with("fr") {
            Ok(Locale::Fr)
        } else if lang.starts_with("en") {
            Ok(Locale::En)
        } else {
            Err(format!("Unsupported locale: {}", s))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err: AppError = ValidationError::RecurrenceRuleRequired.into();
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err: AppError = ConflictError::Appointment(vec![]).into();
        assert_eq!(err.category(), ErrorCategory::Conflict);

        let err = AppError::not_found(EntityKind::Instructor, 9);
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.to_string(), "Instructor 9 not found");

        let err = AppError::Ownership {
            entity: EntityKind::Availability,
            id: 3,
            instructor_id: 1,
        };
        assert_eq!(err.category(), ErrorCategory::Ownership);
    }

    #[test]
    fn test_localized_messages() {
        let err = AppError::not_found(EntityKind::MeetingPoint, 12);
        assert_eq!(
            err.localized(Locale::Fr),
            "Point de rendez-vous introuvable (id 12)."
        );
        assert_eq!(err.localized(Locale::En), "Meeting point 12 not found");

        let err: AppError = ValidationError::ExpiryNotApplicable.into();
        assert!(err.localized(Locale::Fr).contains("récurrente"));
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!("fr-FR".parse::<Locale>(), Ok(Locale::Fr));
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert!("de".parse::<Locale>().is_err());
        assert_eq!(Locale::default(), Locale::Fr);
    }
}
