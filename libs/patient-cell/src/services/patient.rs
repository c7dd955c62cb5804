use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use auth_cell::PasswordService;
use shared_database::{AppointmentQuery, AppointmentRepository, PatientRepository};
use shared_models::{AppointmentDetails, Entity, Patient};

use crate::models::{PatientError, RegisterPatientRequest};

fn required(field: &str, value: &str) -> Result<String, PatientError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PatientError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

pub struct PatientService {
    patients: Arc<dyn PatientRepository>,
    appointments: Arc<dyn AppointmentRepository>,
}

impl PatientService {
    pub fn new(
        patients: Arc<dyn PatientRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self {
            patients,
            appointments,
        }
    }

    /// Email and phone must both be unused.
    pub async fn register_patient(&self, request: RegisterPatientRequest) -> Result<Patient, PatientError> {
        debug!("Registering patient: {}", request.email);

        let email = required("email", &request.email)?;
        let phone = required("phone", &request.phone)?;

        if self
            .patients
            .find_patient_by_email_or_phone(&email, &phone)
            .await?
            .is_some()
        {
            warn!("Rejected duplicate patient registration for {}", email);
            return Err(PatientError::AlreadyExists(format!("{} / {}", email, phone)));
        }

        if request.password.is_empty() {
            return Err(PatientError::InvalidInput("password must not be empty".to_string()));
        }
        let password_hash = PasswordService::hash_password(&request.password)
            .map_err(|e| PatientError::Internal(e.to_string()))?;

        let patient = Patient {
            id: Uuid::new_v4(),
            name: required("name", &request.name)?,
            email,
            phone,
            address: request.address.trim().to_string(),
            password_hash,
        };

        let patient = self.patients.save_patient(patient).await?;
        info!("Patient {} registered", patient.id);
        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        self.patients
            .find_patient(patient_id)
            .await?
            .ok_or(PatientError::NotFound(Entity::Patient))
    }

    /// The patient behind a session identity (their email).
    pub async fn patient_details(&self, identity: &str) -> Result<Patient, PatientError> {
        self.patients
            .find_patient_by_email(identity)
            .await?
            .ok_or(PatientError::NotFound(Entity::Patient))
    }

    /// Only the patient themself may list their appointments.
    pub async fn patient_appointments(
        &self,
        patient_id: Uuid,
        requester: &str,
    ) -> Result<Vec<AppointmentDetails>, PatientError> {
        let patient = self.get_patient(patient_id).await?;

        if !patient.email.eq_ignore_ascii_case(requester) {
            warn!("{} tried to list appointments of patient {}", requester, patient_id);
            return Err(PatientError::Unauthorized);
        }

        Ok(self
            .appointments
            .find_appointment_details(&AppointmentQuery::for_patient(patient_id))
            .await?)
    }
}
