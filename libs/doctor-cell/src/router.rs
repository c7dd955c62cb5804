use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_database::{AppointmentRepository, DoctorRepository};
use shared_utils::extractor::auth_middleware;
use shared_utils::TokenService;

use crate::handlers;
use crate::services::{AvailabilityService, DoctorSearchService, DoctorService};

pub struct DoctorState {
    pub registry: DoctorService,
    pub availability: AvailabilityService,
    pub search: DoctorSearchService,
}

impl DoctorState {
    pub fn new(
        doctors: Arc<dyn DoctorRepository>,
        appointments: Arc<dyn AppointmentRepository>,
    ) -> Self {
        Self {
            registry: DoctorService::new(doctors.clone(), appointments.clone()),
            availability: AvailabilityService::new(doctors.clone(), appointments),
            search: DoctorSearchService::new(doctors),
        }
    }
}

pub fn doctor_routes(state: Arc<DoctorState>, tokens: Arc<TokenService>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/filter", get(handlers::filter_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/availability/{date}", get(handlers::get_availability));

    // Registry writes are admin-only; the role is checked in the handlers.
    let protected_routes = Router::new()
        .route("/", post(handlers::create_doctor))
        .route("/{doctor_id}", put(handlers::update_doctor).delete(handlers::delete_doctor))
        .layer(middleware::from_fn_with_state(tokens, auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
