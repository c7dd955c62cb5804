use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use tracing::debug;

use shared_models::auth::{LoginRequest, Role, SessionResponse, TokenResponse};
use shared_models::error::AppError;

use crate::models::AuthError;
use crate::services::login::LoginService;

#[axum::debug_handler]
pub async fn login(
    State(service): State<Arc<LoginService>>,
    Path(role): Path<String>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let role: Role = role.parse().map_err(|_| AuthError::UnknownRole(role))?;

    let response = service
        .login(role, &request.identifier, &request.password)
        .await?;

    Ok(Json(response))
}

/// Reports who the bearer token belongs to.
#[axum::debug_handler]
pub async fn session(
    State(service): State<Arc<LoginService>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<SessionResponse>, AppError> {
    debug!("Introspecting session token");

    let session = service.tokens().verify(auth.token()).map_err(AppError::Auth)?;

    Ok(Json(SessionResponse {
        valid: true,
        identifier: session.identifier,
        role: session.role,
    }))
}
