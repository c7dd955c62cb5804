use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_models::auth::{Role, Session};
use shared_models::error::AppError;

use crate::jwt::TokenService;

/// Verifies the bearer token and stores the resulting `Session` in the request extensions.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let session = tokens.verify(token).map_err(AppError::Auth)?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

pub fn extract_session<B>(request: &Request<B>) -> Result<Session, AppError> {
    request
        .extensions()
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Auth("Session not found in request extensions".to_string()))
}

/// Fails with `Forbidden` unless the session holds one of `allowed`.
pub fn require_role(session: &Session, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&session.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role {} may not perform this action",
            session.role
        )))
    }
}
