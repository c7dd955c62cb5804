// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use shared_database::{
    AppointmentRepository, DoctorRepository, PatientRepository, PrescriptionRepository,
};
use shared_utils::extractor::auth_middleware;
use shared_utils::TokenService;

use crate::handlers;
use crate::services::{
    AppointmentAccess, AppointmentLifecycleService, BookingValidator, PrescriptionService,
};

pub struct AppointmentState {
    pub lifecycle: AppointmentLifecycleService,
    pub access: AppointmentAccess,
    pub prescriptions: PrescriptionService,
}

impl AppointmentState {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        doctors: Arc<dyn DoctorRepository>,
        patients: Arc<dyn PatientRepository>,
        prescriptions: Arc<dyn PrescriptionRepository>,
        validator: BookingValidator,
    ) -> Self {
        Self {
            lifecycle: AppointmentLifecycleService::new(
                appointments.clone(),
                doctors.clone(),
                patients.clone(),
                validator,
            ),
            access: AppointmentAccess::new(appointments.clone(), doctors.clone(), patients.clone()),
            prescriptions: PrescriptionService::new(prescriptions, appointments, doctors, patients),
        }
    }
}

pub fn appointment_routes(state: Arc<AppointmentState>, tokens: Arc<TokenService>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route("/", get(handlers::list_appointments).post(handlers::book_appointment))
        .route("/schedule/{date}", get(handlers::doctor_schedule))
        .route(
            "/{appointment_id}",
            get(handlers::get_appointment)
                .put(handlers::update_appointment)
                .delete(handlers::cancel_appointment),
        )
        .route("/{appointment_id}/status", patch(handlers::set_status))
        .route(
            "/{appointment_id}/prescription",
            get(handlers::get_prescription).post(handlers::save_prescription),
        )
        .layer(middleware::from_fn_with_state(tokens, auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
