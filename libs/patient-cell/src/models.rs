use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use shared_database::StorageError;
use shared_models::error::AppError;
use shared_models::{AppointmentStatus, Entity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPatientRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientAppointmentFilter {
    /// `past` or `future`.
    pub condition: Option<String>,
    /// Doctor-name substring.
    pub name: Option<String>,
}

/// Status alias used by the history search. It names the stored status and
/// does not look at the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Past,
    Future,
}

impl Condition {
    pub fn status(&self) -> AppointmentStatus {
        match self {
            Condition::Past => AppointmentStatus::Completed,
            Condition::Future => AppointmentStatus::Scheduled,
        }
    }
}

impl FromStr for Condition {
    type Err = PatientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "past" => Ok(Condition::Past),
            "future" => Ok(Condition::Future),
            other => Err(PatientError::InvalidInput(format!(
                "Unknown condition '{}', expected one of: past, future",
                other
            ))),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatientError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("A patient with email or phone {0} already exists")]
    AlreadyExists(String),

    #[error("Unauthorized access to patient data")]
    Unauthorized,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for PatientError {
    fn from(e: StorageError) -> Self {
        error!("Patient storage failure: {}", e);
        PatientError::Internal(e.to_string())
    }
}

impl From<PatientError> for AppError {
    fn from(e: PatientError) -> Self {
        match e {
            PatientError::NotFound(_) => AppError::NotFound(e.to_string()),
            PatientError::AlreadyExists(_) => AppError::Conflict(e.to_string()),
            PatientError::Unauthorized => AppError::Auth(e.to_string()),
            PatientError::InvalidInput(_) => AppError::BadRequest(e.to_string()),
            PatientError::Internal(_) => AppError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_parses_case_insensitively() {
        assert_eq!("PAST".parse::<Condition>(), Ok(Condition::Past));
        assert_eq!(" Future".parse::<Condition>(), Ok(Condition::Future));
        assert_eq!(Condition::Past.status(), AppointmentStatus::Completed);
        assert_eq!(Condition::Future.status(), AppointmentStatus::Scheduled);
    }

    #[test]
    fn unknown_condition_lists_accepted_values() {
        let err = "upcoming".parse::<Condition>().unwrap_err();
        assert!(err.to_string().contains("past, future"));
    }
}
