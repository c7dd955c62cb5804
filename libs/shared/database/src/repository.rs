//! Storage contracts consumed by the scheduling cells.
//!
//! Each entity gets its own repository trait so a service can declare exactly
//! the collaborators it needs. Implementations must be `Send + Sync`; every
//! method is atomic at single-record granularity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentDetails, AppointmentStatus, Doctor, Patient, Prescription,
};

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Another appointment of the same doctor already occupies the time.
    #[error("Doctor {doctor_id} already has an appointment overlapping {scheduled_at}")]
    SlotTaken {
        doctor_id: Uuid,
        scheduled_at: DateTime<Utc>,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Filter for the eagerly joined appointment view. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentQuery {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    /// Case-insensitive substring of the doctor's name.
    pub doctor_name: Option<String>,
    /// Case-insensitive substring of the patient's name.
    pub patient_name: Option<String>,
    pub window: Option<TimeWindow>,
}

impl AppointmentQuery {
    pub fn for_patient(patient_id: Uuid) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Default::default()
        }
    }

    pub fn for_doctor(doctor_id: Uuid) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: Option<AppointmentStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_doctor_name(mut self, name: Option<String>) -> Self {
        self.doctor_name = name;
        self
    }

    pub fn with_patient_name(mut self, name: Option<String>) -> Self {
        self.patient_name = name;
        self
    }

    pub fn within(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }
}

#[async_trait]
pub trait DoctorRepository: Send + Sync {
    async fn find_doctor(&self, id: Uuid) -> StorageResult<Option<Doctor>>;

    async fn find_doctor_by_email(&self, email: &str) -> StorageResult<Option<Doctor>>;

    async fn list_doctors(&self) -> StorageResult<Vec<Doctor>>;

    /// Case-insensitive substring match on the name.
    async fn find_doctors_by_name(&self, name: &str) -> StorageResult<Vec<Doctor>>;

    /// Case-insensitive exact match on the specialty.
    async fn find_doctors_by_specialty(&self, specialty: &str) -> StorageResult<Vec<Doctor>>;

    async fn find_doctors_by_name_and_specialty(
        &self,
        name: &str,
        specialty: &str,
    ) -> StorageResult<Vec<Doctor>>;

    /// Insert or replace by id.
    async fn save_doctor(&self, doctor: Doctor) -> StorageResult<Doctor>;

    /// Returns false when nothing was deleted.
    async fn delete_doctor(&self, id: Uuid) -> StorageResult<bool>;

    async fn doctor_exists(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.find_doctor(id).await?.is_some())
    }
}

#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn find_patient(&self, id: Uuid) -> StorageResult<Option<Patient>>;

    async fn find_patient_by_email(&self, email: &str) -> StorageResult<Option<Patient>>;

    async fn find_patient_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> StorageResult<Option<Patient>>;

    /// Insert or replace by id.
    async fn save_patient(&self, patient: Patient) -> StorageResult<Patient>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_appointment(&self, id: Uuid) -> StorageResult<Option<Appointment>>;

    /// Inserts unless another appointment of the same doctor overlaps it.
    /// The check and the write happen under one exclusive section.
    async fn insert_appointment_exclusive(&self, appointment: Appointment) -> StorageResult<Appointment>;

    /// Replaces an existing record under the same exclusivity rule as insert,
    /// ignoring the record itself. Returns `Ok(None)` when the id is unknown.
    async fn update_appointment_exclusive(
        &self,
        appointment: Appointment,
    ) -> StorageResult<Option<Appointment>>;

    /// Also removes the appointment's prescription.
    async fn delete_appointment(&self, id: Uuid) -> StorageResult<bool>;

    async fn list_appointments_by_doctor(&self, doctor_id: Uuid) -> StorageResult<Vec<Appointment>>;

    async fn list_appointments_by_patient(&self, patient_id: Uuid) -> StorageResult<Vec<Appointment>>;

    async fn list_appointments_by_doctor_between(
        &self,
        doctor_id: Uuid,
        window: TimeWindow,
    ) -> StorageResult<Vec<Appointment>>;

    /// Returns the number of appointments removed. Their prescriptions go too.
    async fn delete_appointments_by_doctor(&self, doctor_id: Uuid) -> StorageResult<usize>;

    /// Returns false when the id is unknown.
    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> StorageResult<bool>;

    /// Appointments joined with doctor and patient display fields, ordered by
    /// start time. Records whose doctor or patient no longer exists are skipped.
    async fn find_appointment_details(
        &self,
        query: &AppointmentQuery,
    ) -> StorageResult<Vec<AppointmentDetails>>;
}

#[async_trait]
pub trait PrescriptionRepository: Send + Sync {
    async fn find_prescription_by_appointment(
        &self,
        appointment_id: Uuid,
    ) -> StorageResult<Option<Prescription>>;

    /// Returns false, writing nothing, when the appointment already has one.
    async fn insert_prescription(&self, prescription: Prescription) -> StorageResult<bool>;
}
