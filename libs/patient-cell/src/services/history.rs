use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_database::{AppointmentQuery, AppointmentRepository};
use shared_models::{non_wildcard, AppointmentDetails};

use crate::models::{Condition, PatientError};

pub struct PatientHistoryService {
    appointments: Arc<dyn AppointmentRepository>,
}

impl PatientHistoryService {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    /// A patient's appointments, optionally narrowed by status alias and by a
    /// doctor-name substring. Absent, empty and `"null"` values do not filter.
    pub async fn filter_patient_appointments(
        &self,
        patient_id: Uuid,
        condition: Option<&str>,
        doctor_name: Option<&str>,
    ) -> Result<Vec<AppointmentDetails>, PatientError> {
        let status = non_wildcard(condition)
            .map(str::parse::<Condition>)
            .transpose()?
            .map(|condition| condition.status());
        let doctor_name = non_wildcard(doctor_name);

        debug!(
            "Filtering appointments of patient {}: status={:?} doctor={:?}",
            patient_id, status, doctor_name
        );

        let query = AppointmentQuery::for_patient(patient_id)
            .with_status(status)
            .with_doctor_name(doctor_name.map(str::to_string));

        Ok(self.appointments.find_appointment_details(&query).await?)
    }
}
