use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::auth::{Role, Session};
use shared_models::error::AppError;
use shared_models::{AppointmentDetails, Patient};
use shared_utils::extractor::require_role;

use crate::models::{PatientAppointmentFilter, RegisterPatientRequest};
use crate::router::PatientState;

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<PatientState>>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<Patient>), AppError> {
    let patient = state.registry.register_patient(request).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

#[axum::debug_handler]
pub async fn get_patient_profile(
    State(state): State<Arc<PatientState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Patient>, AppError> {
    require_role(&session, &[Role::Patient])?;

    Ok(Json(state.registry.patient_details(&session.identifier).await?))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<PatientState>>,
    Extension(session): Extension<Session>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Patient>, AppError> {
    require_role(&session, &[Role::Admin, Role::Doctor, Role::Patient])?;

    Ok(Json(state.registry.get_patient(patient_id).await?))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<PatientState>>,
    Extension(session): Extension<Session>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Vec<AppointmentDetails>>, AppError> {
    let appointments = state
        .registry
        .patient_appointments(patient_id, &session.identifier)
        .await?;
    Ok(Json(appointments))
}

/// History search over the calling patient's own appointments.
#[axum::debug_handler]
pub async fn filter_appointments(
    State(state): State<Arc<PatientState>>,
    Extension(session): Extension<Session>,
    Query(filter): Query<PatientAppointmentFilter>,
) -> Result<Json<Vec<AppointmentDetails>>, AppError> {
    require_role(&session, &[Role::Patient])?;

    let patient = state.registry.patient_details(&session.identifier).await?;
    let appointments = state
        .history
        .filter_patient_appointments(
            patient.id,
            filter.condition.as_deref(),
            filter.name.as_deref(),
        )
        .await?;

    Ok(Json(appointments))
}
