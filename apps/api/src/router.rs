use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::{appointment_routes, AppointmentState, BookingValidator};
use auth_cell::{auth_routes, LoginService};
use doctor_cell::{doctor_routes, AvailabilityService, DoctorState};
use patient_cell::{create_patient_router, PatientState};
use shared_config::AppConfig;
use shared_database::InMemoryStore;
use shared_utils::TokenService;

/// Wires every cell onto one store. All cells share the store so the
/// per-doctor exclusivity check sees every booking.
pub fn create_router(config: Arc<AppConfig>) -> Router {
    let store = Arc::new(InMemoryStore::new());
    let tokens = Arc::new(TokenService::from_config(&config));

    let login = Arc::new(LoginService::new(
        store.clone(),
        store.clone(),
        tokens.clone(),
        config.clone(),
    ));

    let doctors = Arc::new(DoctorState::new(store.clone(), store.clone()));

    let validator = BookingValidator::new(
        store.clone(),
        Arc::new(AvailabilityService::new(store.clone(), store.clone())),
        config.booking_policy,
    );
    let appointments = Arc::new(AppointmentState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        validator,
    ));

    let patients = Arc::new(PatientState::new(store.clone(), store));

    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/auth", auth_routes(login))
        .nest("/doctors", doctor_routes(doctors, tokens.clone()))
        .nest("/appointments", appointment_routes(appointments, tokens.clone()))
        .nest("/patients", create_patient_router(patients, tokens))
}
