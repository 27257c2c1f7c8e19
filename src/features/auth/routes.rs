use crate::features::auth::handlers;
use crate::features::auth::services::AuthService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Auth routes that work without a session
pub fn public_routes(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .with_state(service)
}

/// Auth routes that require a session
pub fn protected_routes() -> Router {
    Router::new().route("/api/auth/me", get(handlers::get_me))
}
