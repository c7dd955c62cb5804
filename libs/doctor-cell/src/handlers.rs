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
use shared_models::Doctor;
use shared_utils::extractor::require_role;

use crate::models::{
    AvailabilityResponse, CreateDoctorRequest, DeleteDoctorResponse, DoctorSearchQuery,
    DoctorSearchResponse, UpdateDoctorRequest,
};
use crate::router::DoctorState;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<DoctorState>>,
) -> Result<Json<Vec<Doctor>>, AppError> {
    Ok(Json(state.registry.list_doctors().await?))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Doctor>, AppError> {
    Ok(Json(state.registry.get_doctor(doctor_id).await?))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<DoctorState>>,
    Path((doctor_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    Ok(Json(state.availability.availability(doctor_id, date).await?))
}

#[axum::debug_handler]
pub async fn filter_doctors(
    State(state): State<Arc<DoctorState>>,
    Query(query): Query<DoctorSearchQuery>,
) -> Result<Json<DoctorSearchResponse>, AppError> {
    let response = state
        .search
        .filter_doctors(
            query.name.as_deref(),
            query.specialty.as_deref(),
            query.time.as_deref(),
        )
        .await?;

    Ok(Json(response))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Session>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Doctor>), AppError> {
    require_role(&session, &[Role::Admin])?;

    let doctor = state.registry.create_doctor(request).await?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Session>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Doctor>, AppError> {
    require_role(&session, &[Role::Admin])?;

    Ok(Json(state.registry.update_doctor(doctor_id, request).await?))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<DoctorState>>,
    Extension(session): Extension<Session>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<DeleteDoctorResponse>, AppError> {
    require_role(&session, &[Role::Admin])?;

    Ok(Json(state.registry.delete_doctor(doctor_id).await?))
}
