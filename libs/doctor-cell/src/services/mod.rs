pub mod availability;
pub mod doctor;
pub mod search;

pub use availability::AvailabilityService;
pub use doctor::DoctorService;
pub use search::DoctorSearchService;
