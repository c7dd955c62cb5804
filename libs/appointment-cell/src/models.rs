// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use doctor_cell::DoctorError;
use shared_database::StorageError;
use shared_models::error::AppError;
use shared_models::{Appointment, AppointmentStatus, Entity};

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl UpdateAppointmentRequest {
    pub fn into_appointment(self, id: Uuid) -> Appointment {
        Appointment {
            id,
            doctor_id: self.doctor_id,
            patient_id: self.patient_id,
            scheduled_at: self.scheduled_at,
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAppointmentsQuery {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorScheduleQuery {
    /// Patient-name substring.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionRequest {
    pub medication: String,
    pub dosage: String,
    #[serde(default)]
    pub doctor_notes: Option<String>,
}

/// Whose appointments to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentOwner {
    Doctor(Uuid),
    Patient(Uuid),
}

// ==============================================================================
// VALIDATION & OUTCOMES
// ==============================================================================

/// A proposed slot for a doctor. `exclude` names an appointment that must
/// not count as occupying its own slot (used when moving it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingCandidate {
    pub doctor_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub exclude: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotValidation {
    Valid,
    NoMatchingSlot,
    DoctorNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

impl From<&Appointment> for BookingConfirmation {
    fn from(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id,
            doctor_id: appointment.doctor_id,
            patient_id: appointment.patient_id,
            scheduled_at: appointment.scheduled_at,
            end_at: appointment.end_at(),
            status: appointment.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UpdateOutcome {
    Updated { appointment: Appointment },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    Canceled { appointment_id: Uuid },
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppointmentError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("Not authorized to access this appointment")]
    Unauthorized,

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("Scheduling conflict: {0}")]
    SchedulingConflict(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Appointment status cannot move from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for AppointmentError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::SlotTaken { .. } => {
                warn!("{}", e);
                AppointmentError::SchedulingConflict(e.to_string())
            }
            StorageError::Unavailable(_) => {
                error!("Appointment storage failure: {}", e);
                AppointmentError::Internal(e.to_string())
            }
        }
    }
}

impl From<DoctorError> for AppointmentError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound(entity) => AppointmentError::NotFound(entity),
            DoctorError::InvalidInput(msg) => AppointmentError::InvalidInput(msg),
            DoctorError::AlreadyExists(_) | DoctorError::Internal(_) => {
                AppointmentError::Internal(e.to_string())
            }
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::NotFound(_) => AppError::NotFound(e.to_string()),
            AppointmentError::Unauthorized => AppError::Auth(e.to_string()),
            AppointmentError::SchedulingConflict(_) | AppointmentError::AlreadyExists(_) => {
                AppError::Conflict(e.to_string())
            }
            AppointmentError::InvalidReference(_) | AppointmentError::InvalidTransition { .. } => {
                AppError::ValidationError(e.to_string())
            }
            AppointmentError::InvalidInput(_) => AppError::BadRequest(e.to_string()),
            AppointmentError::Internal(_) => AppError::Internal(e.to_string()),
        }
    }
}
