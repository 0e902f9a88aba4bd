// Scheduling Configuration (environment driven)

use crate::error::{AppError, Locale, Result};

pub const ENV_LOCALE: &str = "DRIVEBOOK_LOCALE";
pub const ENV_SERIALIZE_PER_INSTRUCTOR: &str = "DRIVEBOOK_SERIALIZE_PER_INSTRUCTOR";
pub const ENV_DATABASE_URL: &str = "DRIVEBOOK_DATABASE_URL";

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

/// Runtime settings for the scheduling services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingConfig {
    /// Language of instructor-facing error messages
    pub locale: Locale,

    /// Hold a per-instructor lock across validate + persist.
    ///
    /// Off by default: two concurrent bookings for the same slot may both
    /// pass the conflict scan.
    pub serialize_per_instructor: bool,

    /// Database URL for the storage adapter
    pub database_url: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            locale: Locale::Fr,
            serialize_per_instructor: false,
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl SchedulingConfig {
    /// Load from process environment, falling back to defaults for unset keys
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let locale = match lookup(ENV_LOCALE) {
            Some(raw) => raw
                .parse::<Locale>()
                .map_err(|e| AppError::Config(format!("{}: {}", ENV_LOCALE, e)))?,
            None => defaults.locale,
        };

        let serialize_per_instructor = match lookup(ENV_SERIALIZE_PER_INSTRUCTOR) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                AppError::Config(format!(
                    "{}: expected true/false, got {:?}",
                    ENV_SERIALIZE_PER_INSTRUCTOR, raw
                ))
            })?,
            None => defaults.serialize_per_instructor,
        };

        let database_url = lookup(ENV_DATABASE_URL).unwrap_or(defaults.database_url);

        Ok(Self {
            locale,
            serialize_per_instructor,
            database_url,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
