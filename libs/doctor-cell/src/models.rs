use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use shared_database::StorageError;
use shared_models::error::AppError;
use shared_models::{Doctor, Entity, SlotParseError};

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub specialty: String,
    pub email: String,
    pub password: String,
    /// Slot labels, `HH:MM-HH:MM`.
    #[serde(default)]
    pub available_times: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub email: Option<String>,
    /// Replaces the stored credential when present.
    pub password: Option<String>,
    pub available_times: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchQuery {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub time: Option<String>,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub available_slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSearchResponse {
    pub doctors: Vec<Doctor>,
    pub count: usize,
}

impl DoctorSearchResponse {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        let count = doctors.len();
        Self { doctors, count }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDoctorResponse {
    pub doctor_id: Uuid,
    pub deleted_appointments: usize,
}

// ==============================================================================
// SEARCH BUCKETS
// ==============================================================================

/// Half-day bucket a doctor's template slots are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    /// Some slot starts before noon.
    Am,
    /// Some slot starts at or after noon.
    Pm,
}

impl TimeBucket {
    pub fn admits(&self, doctor: &Doctor) -> bool {
        match self {
            TimeBucket::Am => doctor.has_morning_slot(),
            TimeBucket::Pm => doctor.has_afternoon_slot(),
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBucket::Am => write!(f, "AM"),
            TimeBucket::Pm => write!(f, "PM"),
        }
    }
}

impl FromStr for TimeBucket {
    type Err = DoctorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "am" => Ok(TimeBucket::Am),
            "pm" => Ok(TimeBucket::Pm),
            other => Err(DoctorError::InvalidInput(format!(
                "Unknown time bucket '{}', expected one of: AM, PM",
                other
            ))),
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DoctorError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("A doctor with email {0} already exists")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for DoctorError {
    fn from(e: StorageError) -> Self {
        error!("Doctor storage failure: {}", e);
        DoctorError::Internal(e.to_string())
    }
}

impl From<SlotParseError> for DoctorError {
    fn from(e: SlotParseError) -> Self {
        DoctorError::InvalidInput(e.to_string())
    }
}

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound(_) => AppError::NotFound(e.to_string()),
            DoctorError::AlreadyExists(_) => AppError::Conflict(e.to_string()),
            DoctorError::InvalidInput(_) => AppError::BadRequest(e.to_string()),
            DoctorError::Internal(_) => AppError::Internal(e.to_string()),
        }
    }
}
