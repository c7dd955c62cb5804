use thiserror::Error;
use tracing::error;

use shared_database::StorageError;
use shared_models::error::AppError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unknown role '{0}', expected admin, doctor or patient")]
    UnknownRole(String),

    #[error("Could not issue token: {0}")]
    TokenIssue(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        error!("Storage failure during login: {}", e);
        AuthError::Internal(e.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::Auth(e.to_string()),
            AuthError::UnknownRole(_) => AppError::BadRequest(e.to_string()),
            AuthError::TokenIssue(_) | AuthError::Internal(_) => AppError::Internal(e.to_string()),
        }
    }
}
