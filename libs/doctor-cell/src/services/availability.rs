use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::debug;
use uuid::Uuid;

use shared_database::{AppointmentRepository, DoctorRepository, TimeWindow};

use crate::models::{AvailabilityResponse, DoctorError};

/// The UTC day `[date 00:00, date+1 00:00)`.
pub fn day_window(date: NaiveDate) -> TimeWindow {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
    TimeWindow::new(start, start + Duration::days(1))
}

/// Reconciles a doctor's daily slot template against the bookings of one day.
///
/// Nothing is cached: every call reads the template and the day's bookings
/// from storage.
pub struct AvailabilityService {
    doctors: Arc<dyn DoctorRepository>,
    appointments: Arc<dyn AppointmentRepository>,
}

impl AvailabilityService {
    pub fn new(
        doctors: Arc<dyn DoctorRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self {
            doctors,
            appointments,
        }
    }

    /// Open slot labels for `doctor_id` on `date`, in template order.
    /// An unknown doctor has no open slots.
    pub async fn resolve(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<String>, DoctorError> {
        self.resolve_excluding(doctor_id, date, None).await
    }

    /// Like [`resolve`](Self::resolve), but the appointment `exclude` does not
    /// occupy its slot.
    pub async fn resolve_excluding(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<String>, DoctorError> {
        let Some(doctor) = self.doctors.find_doctor(doctor_id).await? else {
            debug!("No availability for unknown doctor {}", doctor_id);
            return Ok(Vec::new());
        };

        let booked: HashSet<String> = self
            .appointments
            .list_appointments_by_doctor_between(doctor_id, day_window(date))
            .await?
            .into_iter()
            .filter(|appointment| Some(appointment.id) != exclude)
            .map(|appointment| appointment.slot().label())
            .collect();

        let open: Vec<String> = doctor
            .available_times
            .iter()
            .map(|slot| slot.label())
            .filter(|label| !booked.contains(label))
            .collect();

        debug!(
            "Doctor {} on {}: {} of {} slots open",
            doctor_id,
            date,
            open.len(),
            doctor.available_times.len()
        );

        Ok(open)
    }

    pub async fn availability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<AvailabilityResponse, DoctorError> {
        let available_slots = self.resolve(doctor_id, date).await?;

        Ok(AvailabilityResponse {
            doctor_id,
            date,
            available_slots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_window_is_one_utc_day() {
        let window = day_window(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(window.start.to_rfc3339(), "2024-05-01T00:00:00+00:00");
        assert_eq!(window.end.to_rfc3339(), "2024-05-02T00:00:00+00:00");
        assert!(!window.contains(window.end));
    }
}
