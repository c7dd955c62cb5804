// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use shared_models::auth::{Role, Session};
use shared_models::error::AppError;
use shared_models::{
    non_wildcard, Appointment, AppointmentDetails, AppointmentStatus, Prescription,
};
use shared_utils::extractor::require_role;

use crate::models::{
    AppointmentError, AppointmentOwner, BookAppointmentRequest, BookingConfirmation,
    CancelOutcome, DoctorScheduleQuery, ListAppointmentsQuery, PrescriptionRequest,
    SetStatusRequest, UpdateAppointmentRequest, UpdateOutcome,
};
use crate::router::AppointmentState;

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(session): Extension<Session>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<BookingConfirmation>), AppError> {
    require_role(&session, &[Role::Patient])?;
    state.access.authorize_booking(&request, &session.identifier).await?;

    let confirmation = state.lifecycle.book(request).await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    state.access.authorize_view(appointment_id, &session).await?;

    Ok(Json(state.lifecycle.get_appointment(appointment_id).await?))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<UpdateOutcome>, AppError> {
    require_role(&session, &[Role::Doctor, Role::Patient])?;

    let replacement = request.into_appointment(appointment_id);
    state
        .access
        .authorize_update(&replacement, &session.identifier)
        .await?;

    let outcome = state.lifecycle.update(replacement).await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<CancelOutcome>, AppError> {
    require_role(&session, &[Role::Doctor, Role::Patient])?;

    Ok(Json(state.lifecycle.cancel(appointment_id, &session.identifier).await?))
}

#[axum::debug_handler]
pub async fn set_status(
    State(state): State<Arc<AppointmentState>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<Appointment>, AppError> {
    require_role(&session, &[Role::Doctor])?;
    state
        .access
        .authorize_status_change(appointment_id, &session.identifier)
        .await?;

    Ok(Json(state.lifecycle.set_status(appointment_id, request.status).await?))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppointmentState>>,
    Extension(session): Extension<Session>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<Vec<AppointmentDetails>>, AppError> {
    let owner = match (query.doctor_id, query.patient_id) {
        (Some(doctor_id), None) => AppointmentOwner::Doctor(doctor_id),
        (None, Some(patient_id)) => AppointmentOwner::Patient(patient_id),
        _ => {
            return Err(AppointmentError::InvalidInput(
                "exactly one of doctor_id or patient_id is required".to_string(),
            )
            .into())
        }
    };

    let status = non_wildcard(query.status.as_deref())
        .map(str::parse::<AppointmentStatus>)
        .transpose()
        .map_err(AppointmentError::InvalidInput)?;

    state.access.authorize_listing(owner, &session).await?;

    Ok(Json(state.lifecycle.list_appointments(owner, status).await?))
}

/// The calling doctor's appointments on `date`.
#[axum::debug_handler]
pub async fn doctor_schedule(
    State(state): State<Arc<AppointmentState>>,
    Extension(session): Extension<Session>,
    Path(date): Path<NaiveDate>,
    Query(query): Query<DoctorScheduleQuery>,
) -> Result<Json<Vec<AppointmentDetails>>, AppError> {
    require_role(&session, &[Role::Doctor])?;

    let schedule = state
        .lifecycle
        .doctor_schedule(&session.identifier, date, query.name.as_deref())
        .await?;
    Ok(Json(schedule))
}

#[axum::debug_handler]
pub async fn save_prescription(
    State(state): State<Arc<AppointmentState>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<PrescriptionRequest>,
) -> Result<(StatusCode, Json<Prescription>), AppError> {
    require_role(&session, &[Role::Doctor])?;

    let prescription = state
        .prescriptions
        .save_prescription(appointment_id, request, &session.identifier)
        .await?;
    Ok((StatusCode::CREATED, Json(prescription)))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(state): State<Arc<AppointmentState>>,
    Extension(session): Extension<Session>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Prescription>, AppError> {
    require_role(&session, &[Role::Doctor])?;

    Ok(Json(
        state
            .prescriptions
            .get_prescription(appointment_id, &session.identifier)
            .await?,
    ))
}
