use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use auth_cell::PasswordService;
use shared_database::{AppointmentRepository, DoctorRepository};
use shared_models::{appointment_duration, Doctor, Entity, TimeSlot};

use crate::models::{
    CreateDoctorRequest, DeleteDoctorResponse, DoctorError, UpdateDoctorRequest,
};

/// Template slots are exactly one appointment long and never overlap, so
/// each listed slot can be booked at its start.
fn parse_slots(labels: &[String]) -> Result<Vec<TimeSlot>, DoctorError> {
    let slots = labels
        .iter()
        .map(|label| label.parse::<TimeSlot>().map_err(DoctorError::from))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(slot) = slots.iter().find(|slot| !slot.spans_one_appointment()) {
        return Err(DoctorError::InvalidInput(format!(
            "slot {} must last exactly {} minutes",
            slot,
            appointment_duration().num_minutes()
        )));
    }

    for (i, slot) in slots.iter().enumerate() {
        if let Some(other) = slots[i + 1..].iter().find(|other| slot.overlaps(other)) {
            return Err(DoctorError::InvalidInput(format!(
                "slots {} and {} overlap",
                slot, other
            )));
        }
    }

    Ok(slots)
}

fn required(field: &str, value: &str) -> Result<String, DoctorError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DoctorError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(value.to_string())
}

fn hash(password: &str) -> Result<String, DoctorError> {
    if password.is_empty() {
        return Err(DoctorError::InvalidInput("password must not be empty".to_string()));
    }
    PasswordService::hash_password(password).map_err(|e| DoctorError::Internal(e.to_string()))
}

/// Doctor directory maintenance.
pub struct DoctorService {
    doctors: Arc<dyn DoctorRepository>,
    appointments: Arc<dyn AppointmentRepository>,
}

impl DoctorService {
    pub fn new(
        doctors: Arc<dyn DoctorRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self {
            doctors,
            appointments,
        }
    }

    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor profile for: {}", request.email);

        let email = required("email", &request.email)?;
        if self.doctors.find_doctor_by_email(&email).await?.is_some() {
            warn!("Rejected duplicate doctor email {}", email);
            return Err(DoctorError::AlreadyExists(email));
        }

        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: required("name", &request.name)?,
            specialty: required("specialty", &request.specialty)?,
            email,
            password_hash: hash(&request.password)?,
            available_times: parse_slots(&request.available_times)?,
        };

        let doctor = self.doctors.save_doctor(doctor).await?;
        info!("Doctor {} created with {} slots", doctor.id, doctor.available_times.len());
        Ok(doctor)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        self.doctors
            .find_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound(Entity::Doctor))
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        Ok(self.doctors.list_doctors().await?)
    }

    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor profile: {}", doctor_id);

        let mut doctor = self.get_doctor(doctor_id).await?;

        if let Some(email) = request.email {
            let email = required("email", &email)?;
            if let Some(owner) = self.doctors.find_doctor_by_email(&email).await? {
                if owner.id != doctor_id {
                    return Err(DoctorError::AlreadyExists(email));
                }
            }
            doctor.email = email;
        }
        if let Some(name) = request.name {
            doctor.name = required("name", &name)?;
        }
        if let Some(specialty) = request.specialty {
            doctor.specialty = required("specialty", &specialty)?;
        }
        if let Some(labels) = request.available_times {
            doctor.available_times = parse_slots(&labels)?;
        }
        if let Some(password) = request.password {
            doctor.password_hash = hash(&password)?;
        }

        let doctor = self.doctors.save_doctor(doctor).await?;
        info!("Doctor {} updated", doctor.id);
        Ok(doctor)
    }

    /// Removes the doctor together with every appointment bound to them.
    pub async fn delete_doctor(&self, doctor_id: Uuid) -> Result<DeleteDoctorResponse, DoctorError> {
        if !self.doctors.doctor_exists(doctor_id).await? {
            return Err(DoctorError::NotFound(Entity::Doctor));
        }

        let deleted_appointments = self.appointments.delete_appointments_by_doctor(doctor_id).await?;
        self.doctors.delete_doctor(doctor_id).await?;

        info!(
            "Doctor {} deleted along with {} appointments",
            doctor_id, deleted_appointments
        );

        Ok(DeleteDoctorResponse {
            doctor_id,
            deleted_appointments,
        })
    }
}
