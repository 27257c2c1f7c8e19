use axum::{routing::post, Router};

use crate::features::drafts::handlers::{self, DraftState};

pub fn routes(state: DraftState) -> Router {
    Router::new()
        .route("/api/complaints/draft", post(handlers::draft_complaint))
        .with_state(state)
}
