use axum::{
    routing::{get, post},
    Router,
};

use crate::features::complaints::handlers::{self, ComplaintState};

/// Citizen-facing routes
pub fn public_routes(state: ComplaintState) -> Router {
    Router::new()
        .route("/api/complaints", post(handlers::submit_complaint))
        .with_state(state)
}

/// Employee routes (require the session guard to be applied by caller)
pub fn employee_routes(state: ComplaintState) -> Router {
    Router::new()
        .route("/api/employee/complaints", get(handlers::list_complaints))
        .route("/api/employee/complaints/{id}", get(handlers::get_complaint))
        .route(
            "/api/employee/complaints/{id}/start",
            post(handlers::start_complaint),
        )
        .route(
            "/api/employee/complaints/{id}/deny",
            post(handlers::deny_complaint),
        )
        .route(
            "/api/employee/complaints/{id}/resolve",
            post(handlers::resolve_complaint),
        )
        .route(
            "/api/employee/dashboard/stats",
            get(handlers::get_dashboard_stats),
        )
        .with_state(state)
}
