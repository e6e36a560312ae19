//! Core error types for fokusplan-core.
//!
//! The engine favors degrading over failing: disabled days, unresolvable
//! blocker references, and unfillable slots all produce empty output rather
//! than errors. The enums here cover the remaining hard failures --
//! configuration that cannot be defaulted and invalid planning ranges.

use chrono::NaiveDate;
use thiserror::Error;

/// Settings validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// Invalid configuration value that has no sensible default
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl SettingsError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        SettingsError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Planning errors surfaced to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Settings failed validation
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Replan range with end before start
    #[error("Invalid planning range: {end} is before {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Result type alias for PlanError
pub type Result<T, E = PlanError> = std::result::Result<T, E>;
