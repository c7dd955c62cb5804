pub mod history;
pub mod patient;

pub use history::PatientHistoryService;
pub use patient::PatientService;
