use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::drafts::dtos::{ComplaintDraftDto, GenerateComplaintDto};
use crate::features::drafts::services::ComplaintDrafter;
use crate::shared::constants::DRAFTING_DISABLED_MESSAGE;
use crate::shared::types::ApiResponse;
use crate::shared::validation::collect_messages;

/// State for draft handlers; `drafter` is `None` when no model is configured
#[derive(Clone)]
pub struct DraftState {
    pub drafter: Option<Arc<dyn ComplaintDrafter>>,
}

/// Draft a complaint from a photo and location (public)
#[utoipa::path(
    post,
    path = "/api/complaints/draft",
    request_body = GenerateComplaintDto,
    responses(
        (status = 200, description = "Complaint drafted", body = ApiResponse<ComplaintDraftDto>),
        (status = 400, description = "Validation error"),
        (status = 502, description = "Vision model failed"),
        (status = 503, description = "Drafting not configured")
    ),
    tag = "drafts"
)]
pub async fn draft_complaint(
    State(state): State<DraftState>,
    AppJson(dto): AppJson<GenerateComplaintDto>,
) -> Result<Json<ApiResponse<ComplaintDraftDto>>> {
    let drafter = state
        .drafter
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable(DRAFTING_DISABLED_MESSAGE.to_string()))?;

    dto.validate().map_err(|e| {
        let messages = collect_messages(&e);
        AppError::Validation(messages.join(", "))
    })?;

    let draft = drafter.draft(&dto).await?;

    Ok(Json(ApiResponse::success(Some(draft), None, None)))
}
