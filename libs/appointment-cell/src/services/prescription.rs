// libs/appointment-cell/src/services/prescription.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{
    AppointmentRepository, DoctorRepository, PatientRepository, PrescriptionRepository,
};
use shared_models::{Appointment, Entity, Prescription};

use crate::models::{AppointmentError, PrescriptionRequest};
use crate::services::access::{party_of, AppointmentParty};

fn required(field: &str, value: &str) -> Result<String, AppointmentError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppointmentError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// One prescription per appointment, written and read by the appointment's doctor.
pub struct PrescriptionService {
    prescriptions: Arc<dyn PrescriptionRepository>,
    appointments: Arc<dyn AppointmentRepository>,
    doctors: Arc<dyn DoctorRepository>,
    patients: Arc<dyn PatientRepository>,
}

impl PrescriptionService {
    pub fn new(
        prescriptions: Arc<dyn PrescriptionRepository>,
        appointments: Arc<dyn AppointmentRepository>,
        doctors: Arc<dyn DoctorRepository>,
        patients: Arc<dyn PatientRepository>,
    ) -> Self {
        Self {
            prescriptions,
            appointments,
            doctors,
            patients,
        }
    }

    /// Loads the appointment and checks that `requester` is its doctor.
    async fn doctor_of(
        &self,
        appointment_id: Uuid,
        requester: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .appointments
            .find_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound(Entity::Appointment))?;

        let party = party_of(
            self.doctors.as_ref(),
            self.patients.as_ref(),
            &appointment,
            requester,
        )
        .await?;
        if party != Some(AppointmentParty::Doctor) {
            warn!("{} is not the doctor of appointment {}", requester, appointment_id);
            return Err(AppointmentError::Unauthorized);
        }
        Ok(appointment)
    }

    pub async fn save_prescription(
        &self,
        appointment_id: Uuid,
        request: PrescriptionRequest,
        requester: &str,
    ) -> Result<Prescription, AppointmentError> {
        debug!("Prescription for appointment {} requested by {}", appointment_id, requester);

        let appointment = self.doctor_of(appointment_id, requester).await?;

        let prescription = Prescription {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            medication: required("medication", &request.medication)?,
            dosage: required("dosage", &request.dosage)?,
            doctor_notes: request
                .doctor_notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            issued_at: Utc::now(),
        };

        if !self.prescriptions.insert_prescription(prescription.clone()).await? {
            return Err(AppointmentError::AlreadyExists(format!(
                "Prescription for appointment {}",
                appointment_id
            )));
        }

        info!("Prescription {} issued for appointment {}", prescription.id, appointment_id);
        Ok(prescription)
    }

    pub async fn get_prescription(
        &self,
        appointment_id: Uuid,
        requester: &str,
    ) -> Result<Prescription, AppointmentError> {
        self.doctor_of(appointment_id, requester).await?;

        self.prescriptions
            .find_prescription_by_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound(Entity::Prescription))
    }
}
