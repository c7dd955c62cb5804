pub mod memory;
pub mod repository;

pub use memory::InMemoryStore;
pub use repository::{
    AppointmentQuery, AppointmentRepository, DoctorRepository, PatientRepository,
    PrescriptionRepository, StorageError, StorageResult, TimeWindow,
};
