use std::sync::Arc;

use chrono::Timelike;
use tracing::{debug, warn};

use doctor_cell::AvailabilityService;
use shared_config::BookingPolicy;
use shared_database::DoctorRepository;
use shared_models::TimeSlot;

use crate::models::{AppointmentError, BookingCandidate, SlotValidation};

/// Decides whether a proposed start time may be booked with a doctor.
pub struct BookingValidator {
    doctors: Arc<dyn DoctorRepository>,
    availability: Arc<AvailabilityService>,
    policy: BookingPolicy,
}

impl BookingValidator {
    pub fn new(
        doctors: Arc<dyn DoctorRepository>,
        availability: Arc<AvailabilityService>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            doctors,
            availability,
            policy,
        }
    }

    /// Under the strict policy the start must coincide exactly, to the
    /// second, with the start of an open slot on that day. The permissive
    /// policy only requires the doctor to exist.
    pub async fn validate(&self, candidate: &BookingCandidate) -> Result<SlotValidation, AppointmentError> {
        if !self.doctors.doctor_exists(candidate.doctor_id).await? {
            warn!("Booking rejected: doctor {} does not exist", candidate.doctor_id);
            return Ok(SlotValidation::DoctorNotFound);
        }

        if self.policy == BookingPolicy::Permissive {
            return Ok(SlotValidation::Valid);
        }

        let start = candidate.scheduled_at.time();
        if start.second() != 0 || start.nanosecond() != 0 {
            debug!("Start {} is not on a minute boundary", candidate.scheduled_at);
            return Ok(SlotValidation::NoMatchingSlot);
        }

        let open = self
            .availability
            .resolve_excluding(
                candidate.doctor_id,
                candidate.scheduled_at.date_naive(),
                candidate.exclude,
            )
            .await?;

        let matches = open
            .iter()
            .filter_map(|label| label.parse::<TimeSlot>().ok())
            .any(|slot| slot.start == start);

        if matches {
            Ok(SlotValidation::Valid)
        } else {
            warn!(
                "Booking rejected: {} is not an open slot of doctor {}",
                candidate.scheduled_at, candidate.doctor_id
            );
            Ok(SlotValidation::NoMatchingSlot)
        }
    }
}
