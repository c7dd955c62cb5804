use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::{AppointmentRepository, PatientRepository};
use shared_utils::extractor::auth_middleware;
use shared_utils::TokenService;

use crate::handlers::*;
use crate::services::{PatientHistoryService, PatientService};

pub struct PatientState {
    pub registry: PatientService,
    pub history: PatientHistoryService,
}

impl PatientState {
    pub fn new(
        patients: Arc<dyn PatientRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self {
            registry: PatientService::new(patients, appointments.clone()),
            history: PatientHistoryService::new(appointments),
        }
    }
}

pub fn create_patient_router(state: Arc<PatientState>, tokens: Arc<TokenService>) -> Router {
    let public_routes = Router::new().route("/", post(register_patient));

    let protected_routes = Router::new()
        .route("/me", get(get_patient_profile))
        .route("/appointments/filter", get(filter_appointments))
        .route("/{id}", get(get_patient))
        .route("/{id}/appointments", get(get_patient_appointments))
        .layer(middleware::from_fn_with_state(tokens, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
