use std::sync::Arc;

use tracing::debug;

use shared_database::DoctorRepository;
use shared_models::non_wildcard;

use crate::models::{DoctorError, DoctorSearchResponse, TimeBucket};

pub struct DoctorSearchService {
    doctors: Arc<dyn DoctorRepository>,
}

impl DoctorSearchService {
    pub fn new(doctors: Arc<dyn DoctorRepository>) -> Self {
        Self { doctors }
    }

    /// Narrows the directory by name substring and specialty, then by the
    /// half-day bucket of the doctor's template slots. Absent, empty and
    /// `"null"` values do not filter.
    pub async fn filter_doctors(
        &self,
        name: Option<&str>,
        specialty: Option<&str>,
        time: Option<&str>,
    ) -> Result<DoctorSearchResponse, DoctorError> {
        let bucket = non_wildcard(time).map(str::parse::<TimeBucket>).transpose()?;
        let name = non_wildcard(name);
        let specialty = non_wildcard(specialty);

        debug!(
            "Filtering doctors: name={:?} specialty={:?} time={:?}",
            name, specialty, bucket
        );

        let candidates = match (name, specialty) {
            (Some(name), Some(specialty)) => {
                self.doctors
                    .find_doctors_by_name_and_specialty(name, specialty)
                    .await?
            }
            (Some(name), None) => self.doctors.find_doctors_by_name(name).await?,
            (None, Some(specialty)) => self.doctors.find_doctors_by_specialty(specialty).await?,
            (None, None) => self.doctors.list_doctors().await?,
        };

        let doctors = match bucket {
            Some(bucket) => candidates
                .into_iter()
                .filter(|doctor| bucket.admits(doctor))
                .collect(),
            None => candidates,
        };

        Ok(DoctorSearchResponse::new(doctors))
    }
}
