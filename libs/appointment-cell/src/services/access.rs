// libs/appointment-cell/src/services/access.rs
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use shared_database::{AppointmentRepository, DoctorRepository, PatientRepository};
use shared_models::auth::{Role, Session};
use shared_models::{Appointment, Entity};

use crate::models::{AppointmentError, AppointmentOwner, BookAppointmentRequest};

/// Which side of an appointment a caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentParty {
    Doctor,
    Patient,
}

/// Resolves `requester` (a session email) against the doctor and patient
/// bound to `appointment`. Emails compare case-insensitively.
pub async fn party_of(
    doctors: &dyn DoctorRepository,
    patients: &dyn PatientRepository,
    appointment: &Appointment,
    requester: &str,
) -> Result<Option<AppointmentParty>, AppointmentError> {
    if let Some(doctor) = doctors.find_doctor(appointment.doctor_id).await? {
        if doctor.email.eq_ignore_ascii_case(requester) {
            return Ok(Some(AppointmentParty::Doctor));
        }
    }
    if let Some(patient) = patients.find_patient(appointment.patient_id).await? {
        if patient.email.eq_ignore_ascii_case(requester) {
            return Ok(Some(AppointmentParty::Patient));
        }
    }
    Ok(None)
}

/// Decides whether a session may see or touch a given appointment.
///
/// Admins may read everything. Otherwise the caller has to be the doctor or
/// the patient the record names; a failed check is `Unauthorized`.
pub struct AppointmentAccess {
    appointments: Arc<dyn AppointmentRepository>,
    doctors: Arc<dyn DoctorRepository>,
    patients: Arc<dyn PatientRepository>,
}

impl AppointmentAccess {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        doctors: Arc<dyn DoctorRepository>,
        patients: Arc<dyn PatientRepository>,
    ) -> Self {
        Self {
            appointments,
            doctors,
            patients,
        }
    }

    fn denied(session: &str, what: &str) -> AppointmentError {
        warn!("{} may not {}", session, what);
        AppointmentError::Unauthorized
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.appointments
            .find_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound(Entity::Appointment))
    }

    async fn own_doctor_id(&self, email: &str) -> Result<Option<Uuid>, AppointmentError> {
        Ok(self.doctors.find_doctor_by_email(email).await?.map(|d| d.id))
    }

    async fn own_patient_id(&self, email: &str) -> Result<Option<Uuid>, AppointmentError> {
        Ok(self.patients.find_patient_by_email(email).await?.map(|p| p.id))
    }

    /// A doctor may list only their own appointments and a patient only
    /// theirs.
    pub async fn authorize_listing(
        &self,
        owner: AppointmentOwner,
        session: &Session,
    ) -> Result<(), AppointmentError> {
        let allowed = match (owner, session.role) {
            (_, Role::Admin) => true,
            (AppointmentOwner::Doctor(doctor_id), Role::Doctor) => {
                self.own_doctor_id(&session.identifier).await? == Some(doctor_id)
            }
            (AppointmentOwner::Patient(patient_id), Role::Patient) => {
                self.own_patient_id(&session.identifier).await? == Some(patient_id)
            }
            _ => false,
        };

        if !allowed {
            return Err(Self::denied(&session.identifier, "list these appointments"));
        }
        Ok(())
    }

    pub async fn authorize_view(
        &self,
        appointment_id: Uuid,
        session: &Session,
    ) -> Result<(), AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if session.is(Role::Admin) {
            return Ok(());
        }

        let party = party_of(
            self.doctors.as_ref(),
            self.patients.as_ref(),
            &appointment,
            &session.identifier,
        )
        .await?;
        if party.is_none() {
            return Err(Self::denied(&session.identifier, "view this appointment"));
        }
        Ok(())
    }

    /// Patients book for themselves only.
    pub async fn authorize_booking(
        &self,
        request: &BookAppointmentRequest,
        requester: &str,
    ) -> Result<(), AppointmentError> {
        if self.own_patient_id(requester).await? != Some(request.patient_id) {
            return Err(Self::denied(requester, "book for another patient"));
        }
        Ok(())
    }

    /// The caller must be a party of the stored appointment and stay a
    /// party of the replacement, on the same side.
    pub async fn authorize_update(
        &self,
        replacement: &Appointment,
        requester: &str,
    ) -> Result<(), AppointmentError> {
        let existing = self.load(replacement.id).await?;

        let before = party_of(self.doctors.as_ref(), self.patients.as_ref(), &existing, requester)
            .await?;
        let after = party_of(self.doctors.as_ref(), self.patients.as_ref(), replacement, requester)
            .await?;

        match (before, after) {
            (Some(before), Some(after)) if before == after => Ok(()),
            _ => Err(Self::denied(requester, "rewrite this appointment")),
        }
    }

    /// Only the doctor bound to the appointment moves its status.
    pub async fn authorize_status_change(
        &self,
        appointment_id: Uuid,
        requester: &str,
    ) -> Result<(), AppointmentError> {
        let appointment = self.load(appointment_id).await?;

        let party = party_of(
            self.doctors.as_ref(),
            self.patients.as_ref(),
            &appointment,
            requester,
        )
        .await?;
        if party != Some(AppointmentParty::Doctor) {
            return Err(Self::denied(requester, "change the status of this appointment"));
        }
        Ok(())
    }
}
