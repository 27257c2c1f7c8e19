use axum::{
    routing::{get, post},
    Router,
};

use crate::features::pages::handlers::{self, PageState};

/// HTML routes; the session middleware guards everything under the dashboard
pub fn routes(state: PageState) -> Router {
    Router::new()
        .route("/", get(handlers::landing))
        .route("/report", get(handlers::report))
        .route(
            "/employee/login",
            get(handlers::login_page).post(handlers::login_submit),
        )
        .route("/employee/logout", post(handlers::logout))
        .route("/employee/dashboard", get(handlers::dashboard))
        .route(
            "/employee/dashboard/complaints/{id}/start",
            post(handlers::start_action),
        )
        .route(
            "/employee/dashboard/complaints/{id}/deny",
            post(handlers::deny_action),
        )
        .route(
            "/employee/dashboard/complaints/{id}/resolve",
            post(handlers::resolve_action),
        )
        .with_state(state)
}
