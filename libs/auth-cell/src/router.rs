use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::login::LoginService;

pub fn auth_routes(service: Arc<LoginService>) -> Router {
    Router::new()
        .route("/{role}/login", post(handlers::login))
        .route("/session", get(handlers::session))
        .with_state(service)
}
