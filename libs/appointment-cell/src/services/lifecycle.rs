// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::availability::day_window;
use shared_database::{AppointmentQuery, AppointmentRepository, DoctorRepository, PatientRepository};
use shared_models::{
    non_wildcard, Appointment, AppointmentDetails, AppointmentStatus, Entity,
};

use crate::models::{
    AppointmentError, AppointmentOwner, BookAppointmentRequest, BookingCandidate,
    BookingConfirmation, CancelOutcome, SlotValidation, UpdateOutcome,
};
use crate::services::access::party_of;
use crate::services::validation::BookingValidator;

fn rejection(validation: SlotValidation, candidate: &BookingCandidate) -> Option<AppointmentError> {
    match validation {
        SlotValidation::Valid => None,
        SlotValidation::NoMatchingSlot => Some(AppointmentError::SchedulingConflict(format!(
            "{} is not an open slot for doctor {}",
            candidate.scheduled_at, candidate.doctor_id
        ))),
        SlotValidation::DoctorNotFound => Some(AppointmentError::InvalidReference(format!(
            "Doctor {} does not exist",
            candidate.doctor_id
        ))),
    }
}

/// Creates, moves, completes and cancels appointments.
pub struct AppointmentLifecycleService {
    appointments: Arc<dyn AppointmentRepository>,
    doctors: Arc<dyn DoctorRepository>,
    patients: Arc<dyn PatientRepository>,
    validator: BookingValidator,
}

impl AppointmentLifecycleService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        doctors: Arc<dyn DoctorRepository>,
        patients: Arc<dyn PatientRepository>,
        validator: BookingValidator,
    ) -> Self {
        Self {
            appointments,
            doctors,
            patients,
            validator,
        }
    }

    async fn require_patient(&self, patient_id: Uuid) -> Result<(), AppointmentError> {
        if self.patients.find_patient(patient_id).await?.is_none() {
            warn!("Patient {} does not exist", patient_id);
            return Err(AppointmentError::InvalidReference(format!(
                "Patient {} does not exist",
                patient_id
            )));
        }
        Ok(())
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.appointments
            .find_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound(Entity::Appointment))
    }

    fn check_transition(
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        if !from.can_transition_to(to) {
            warn!("Invalid status transition attempted: {} -> {}", from, to);
            return Err(AppointmentError::InvalidTransition { from, to });
        }
        Ok(())
    }

    pub async fn book(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<BookingConfirmation, AppointmentError> {
        debug!(
            "Booking doctor {} for patient {} at {}",
            request.doctor_id, request.patient_id, request.scheduled_at
        );

        self.require_patient(request.patient_id).await?;

        let candidate = BookingCandidate {
            doctor_id: request.doctor_id,
            scheduled_at: request.scheduled_at,
            exclude: None,
        };
        let validation = self.validator.validate(&candidate).await?;
        if let Some(rejection) = rejection(validation, &candidate) {
            return Err(rejection);
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            scheduled_at: request.scheduled_at,
            status: AppointmentStatus::Scheduled,
        };

        let appointment = self.appointments.insert_appointment_exclusive(appointment).await?;

        info!(
            "Appointment {} booked with doctor {} at {}",
            appointment.id, appointment.doctor_id, appointment.scheduled_at
        );
        Ok(BookingConfirmation::from(&appointment))
    }

    /// Replaces the stored appointment, re-validating its time against the
    /// doctor's open slots with the appointment itself ignored.
    pub async fn update(&self, appointment: Appointment) -> Result<UpdateOutcome, AppointmentError> {
        debug!("Updating appointment {}", appointment.id);

        let existing = self.load(appointment.id).await?;
        Self::check_transition(existing.status, appointment.status)?;
        self.require_patient(appointment.patient_id).await?;

        let candidate = BookingCandidate {
            doctor_id: appointment.doctor_id,
            scheduled_at: appointment.scheduled_at,
            exclude: Some(appointment.id),
        };
        let validation = self.validator.validate(&candidate).await?;
        if let Some(rejection) = rejection(validation, &candidate) {
            return Err(rejection);
        }

        let appointment = self
            .appointments
            .update_appointment_exclusive(appointment)
            .await?
            .ok_or(AppointmentError::NotFound(Entity::Appointment))?;

        info!("Appointment {} updated", appointment.id);
        Ok(UpdateOutcome::Updated { appointment })
    }

    /// Deletes the appointment when `requester` is the email of its doctor or
    /// its patient.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        requester: &str,
    ) -> Result<CancelOutcome, AppointmentError> {
        debug!("Cancel of appointment {} requested by {}", appointment_id, requester);

        let appointment = self.load(appointment_id).await?;

        let party = party_of(
            self.doctors.as_ref(),
            self.patients.as_ref(),
            &appointment,
            requester,
        )
        .await?;

        if party.is_none() {
            warn!(
                "{} is neither doctor nor patient of appointment {}",
                requester, appointment_id
            );
            return Err(AppointmentError::Unauthorized);
        }

        if !self.appointments.delete_appointment(appointment_id).await? {
            return Err(AppointmentError::NotFound(Entity::Appointment));
        }

        info!("Appointment {} canceled by {}", appointment_id, requester);
        Ok(CancelOutcome::Canceled { appointment_id })
    }

    pub async fn set_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.load(appointment_id).await?;
        Self::check_transition(appointment.status, status)?;

        if !self.appointments.update_appointment_status(appointment_id, status).await? {
            return Err(AppointmentError::NotFound(Entity::Appointment));
        }

        info!("Appointment {} is now {}", appointment_id, status);
        appointment.status = status;
        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.load(appointment_id).await
    }

    pub async fn list_appointments(
        &self,
        owner: AppointmentOwner,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        let query = match owner {
            AppointmentOwner::Doctor(doctor_id) => AppointmentQuery::for_doctor(doctor_id),
            AppointmentOwner::Patient(patient_id) => AppointmentQuery::for_patient(patient_id),
        };

        Ok(self
            .appointments
            .find_appointment_details(&query.with_status(status))
            .await?)
    }

    /// One day of the doctor identified by `doctor_email`, optionally
    /// narrowed to patients whose name contains `patient_name`.
    pub async fn doctor_schedule(
        &self,
        doctor_email: &str,
        date: NaiveDate,
        patient_name: Option<&str>,
    ) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        let doctor = self
            .doctors
            .find_doctor_by_email(doctor_email)
            .await?
            .ok_or(AppointmentError::NotFound(Entity::Doctor))?;

        let query = AppointmentQuery::for_doctor(doctor.id)
            .within(day_window(date))
            .with_patient_name(non_wildcard(patient_name).map(str::to_string));

        Ok(self.appointments.find_appointment_details(&query).await?)
    }
}
