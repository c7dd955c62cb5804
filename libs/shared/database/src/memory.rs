//! In-memory storage backend.
//!
//! Used by the API binary for local runs and by every cell's tests. All
//! repository traits are implemented on one store so the joined appointment
//! view and the slot exclusivity check see a consistent snapshot.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentDetails, AppointmentStatus, Doctor, Patient, Prescription,
};

use crate::repository::{
    AppointmentQuery, AppointmentRepository, DoctorRepository, PatientRepository,
    PrescriptionRepository, StorageError, StorageResult, TimeWindow,
};

#[derive(Default)]
struct StoreState {
    doctors: HashMap<Uuid, Doctor>,
    patients: HashMap<Uuid, Patient>,
    appointments: HashMap<Uuid, Appointment>,
    /// Keyed by appointment id.
    prescriptions: HashMap<Uuid, Prescription>,
}

impl StoreState {
    fn overlapping(&self, candidate: &Appointment) -> bool {
        self.appointments.values().any(|existing| {
            existing.id != candidate.id
                && existing.doctor_id == candidate.doctor_id
                && existing.scheduled_at < candidate.end_at()
                && candidate.scheduled_at < existing.end_at()
        })
    }

    fn sorted_appointments<F>(&self, predicate: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut matches: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|appointment| predicate(appointment))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
        matches
    }

    fn sorted_doctors<F>(&self, predicate: F) -> Vec<Doctor>
    where
        F: Fn(&Doctor) -> bool,
    {
        let mut matches: Vec<Doctor> = self
            .doctors
            .values()
            .filter(|doctor| predicate(doctor))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        matches
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StorageError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("in-memory store switched off".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DoctorRepository for InMemoryStore {
    async fn find_doctor(&self, id: Uuid) -> StorageResult<Option<Doctor>> {
        self.ensure_available()?;
        Ok(self.state.read().await.doctors.get(&id).cloned())
    }

    async fn find_doctor_by_email(&self, email: &str) -> StorageResult<Option<Doctor>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state
            .doctors
            .values()
            .find(|doctor| doctor.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_doctors(&self) -> StorageResult<Vec<Doctor>> {
        self.ensure_available()?;
        Ok(self.state.read().await.sorted_doctors(|_| true))
    }

    async fn find_doctors_by_name(&self, name: &str) -> StorageResult<Vec<Doctor>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.sorted_doctors(|doctor| contains_ignore_case(&doctor.name, name)))
    }

    async fn find_doctors_by_specialty(&self, specialty: &str) -> StorageResult<Vec<Doctor>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.sorted_doctors(|doctor| doctor.specialty.eq_ignore_ascii_case(specialty)))
    }

    async fn find_doctors_by_name_and_specialty(
        &self,
        name: &str,
        specialty: &str,
    ) -> StorageResult<Vec<Doctor>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.sorted_doctors(|doctor| {
            contains_ignore_case(&doctor.name, name) && doctor.specialty.eq_ignore_ascii_case(specialty)
        }))
    }

    async fn save_doctor(&self, doctor: Doctor) -> StorageResult<Doctor> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        state.doctors.insert(doctor.id, doctor.clone());
        debug!("Stored doctor {}", doctor.id);
        Ok(doctor)
    }

    async fn delete_doctor(&self, id: Uuid) -> StorageResult<bool> {
        self.ensure_available()?;
        Ok(self.state.write().await.doctors.remove(&id).is_some())
    }
}

#[async_trait]
impl PatientRepository for InMemoryStore {
    async fn find_patient(&self, id: Uuid) -> StorageResult<Option<Patient>> {
        self.ensure_available()?;
        Ok(self.state.read().await.patients.get(&id).cloned())
    }

    async fn find_patient_by_email(&self, email: &str) -> StorageResult<Option<Patient>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state
            .patients
            .values()
            .find(|patient| patient.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_patient_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> StorageResult<Option<Patient>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state
            .patients
            .values()
            .find(|patient| patient.email.eq_ignore_ascii_case(email) || patient.phone == phone)
            .cloned())
    }

    async fn save_patient(&self, patient: Patient) -> StorageResult<Patient> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        state.patients.insert(patient.id, patient.clone());
        debug!("Stored patient {}", patient.id);
        Ok(patient)
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryStore {
    async fn find_appointment(&self, id: Uuid) -> StorageResult<Option<Appointment>> {
        self.ensure_available()?;
        Ok(self.state.read().await.appointments.get(&id).cloned())
    }

    async fn insert_appointment_exclusive(&self, appointment: Appointment) -> StorageResult<Appointment> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        if state.overlapping(&appointment) {
            return Err(StorageError::SlotTaken {
                doctor_id: appointment.doctor_id,
                scheduled_at: appointment.scheduled_at,
            });
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment_exclusive(
        &self,
        appointment: Appointment,
    ) -> StorageResult<Option<Appointment>> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        if !state.appointments.contains_key(&appointment.id) {
            return Ok(None);
        }
        if state.overlapping(&appointment) {
            return Err(StorageError::SlotTaken {
                doctor_id: appointment.doctor_id,
                scheduled_at: appointment.scheduled_at,
            });
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(Some(appointment))
    }

    async fn delete_appointment(&self, id: Uuid) -> StorageResult<bool> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        state.prescriptions.remove(&id);
        Ok(state.appointments.remove(&id).is_some())
    }

    async fn list_appointments_by_doctor(&self, doctor_id: Uuid) -> StorageResult<Vec<Appointment>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.sorted_appointments(|a| a.doctor_id == doctor_id))
    }

    async fn list_appointments_by_patient(&self, patient_id: Uuid) -> StorageResult<Vec<Appointment>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.sorted_appointments(|a| a.patient_id == patient_id))
    }

    async fn list_appointments_by_doctor_between(
        &self,
        doctor_id: Uuid,
        window: TimeWindow,
    ) -> StorageResult<Vec<Appointment>> {
        self.ensure_available()?;
        let state = self.state.read().await;
        Ok(state.sorted_appointments(|a| a.doctor_id == doctor_id && window.contains(a.scheduled_at)))
    }

    async fn delete_appointments_by_doctor(&self, doctor_id: Uuid) -> StorageResult<usize> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        let StoreState {
            appointments,
            prescriptions,
            ..
        } = &mut *state;

        let before = appointments.len();
        appointments.retain(|_, a| a.doctor_id != doctor_id);
        prescriptions.retain(|appointment_id, _| appointments.contains_key(appointment_id));
        Ok(before - appointments.len())
    }

    async fn update_appointment_status(
        &self,
        id: Uuid,
        status: AppointmentStatus,
    ) -> StorageResult<bool> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        match state.appointments.get_mut(&id) {
            Some(appointment) => {
                appointment.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_appointment_details(
        &self,
        query: &AppointmentQuery,
    ) -> StorageResult<Vec<AppointmentDetails>> {
        self.ensure_available()?;
        let state = self.state.read().await;

        let appointments = state.sorted_appointments(|a| {
            query.doctor_id.map_or(true, |id| a.doctor_id == id)
                && query.patient_id.map_or(true, |id| a.patient_id == id)
                && query.status.map_or(true, |status| a.status == status)
                && query.window.map_or(true, |window| window.contains(a.scheduled_at))
        });

        let details = appointments
            .iter()
            .filter_map(|appointment| {
                let doctor = state.doctors.get(&appointment.doctor_id)?;
                let patient = state.patients.get(&appointment.patient_id)?;
                Some((appointment, doctor, patient))
            })
            .filter(|(_, doctor, patient)| {
                query
                    .doctor_name
                    .as_deref()
                    .map_or(true, |name| contains_ignore_case(&doctor.name, name))
                    && query
                        .patient_name
                        .as_deref()
                        .map_or(true, |name| contains_ignore_case(&patient.name, name))
            })
            .map(|(appointment, doctor, patient)| AppointmentDetails::assemble(appointment, doctor, patient))
            .collect();

        Ok(details)
    }
}

#[async_trait]
impl PrescriptionRepository for InMemoryStore {
    async fn find_prescription_by_appointment(
        &self,
        appointment_id: Uuid,
    ) -> StorageResult<Option<Prescription>> {
        self.ensure_available()?;
        Ok(self.state.read().await.prescriptions.get(&appointment_id).cloned())
    }

    async fn insert_prescription(&self, prescription: Prescription) -> StorageResult<bool> {
        self.ensure_available()?;
        let mut state = self.state.write().await;
        if state.prescriptions.contains_key(&prescription.appointment_id) {
            return Ok(false);
        }
        debug!("Stored prescription for appointment {}", prescription.appointment_id);
        state.prescriptions.insert(prescription.appointment_id, prescription);
        Ok(true)
    }
}
