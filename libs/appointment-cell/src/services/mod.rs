pub mod access;
pub mod lifecycle;
pub mod prescription;
pub mod validation;

pub use access::{AppointmentAccess, AppointmentParty};
pub use lifecycle::AppointmentLifecycleService;
pub use prescription::PrescriptionService;
pub use validation::BookingValidator;
