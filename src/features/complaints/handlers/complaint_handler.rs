use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::form::ComplaintForm;
use crate::core::error::{AppError, Result};
use crate::features::auth::AuthenticatedEmployee;
use crate::features::complaints::dtos::{
    ComplaintListQuery, ComplaintResponseDto, DashboardStatsDto, ResolveComplaintForm,
    SubmitComplaintForm,
};
use crate::features::complaints::models::Complaint;
use crate::features::complaints::services::ComplaintService;
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::collect_messages;

/// State for complaint handlers
#[derive(Clone)]
pub struct ComplaintState {
    pub service: Arc<ComplaintService>,
    pub google_maps_api_key: Option<Arc<str>>,
}

impl ComplaintState {
    pub fn to_dto(&self, complaint: Complaint) -> ComplaintResponseDto {
        ComplaintResponseDto::new(complaint, self.google_maps_api_key.as_deref())
    }
}

/// Submit a complaint with a photo (public)
#[utoipa::path(
    post,
    path = "/api/complaints",
    request_body(
        content = SubmitComplaintForm,
        content_type = "multipart/form-data",
        description = "Photo plus complaint text and coordinates",
    ),
    responses(
        (status = 201, description = "Complaint submitted", body = ApiResponse<ComplaintResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 413, description = "Image too large")
    ),
    tag = "complaints"
)]
pub async fn submit_complaint(
    State(state): State<ComplaintState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ComplaintResponseDto>>)> {
    let mut form = ComplaintForm::read(&mut multipart).await?;
    let image = form.require_image()?;
    let dto = form.submission()?;
    dto.validate().map_err(|e| {
        let messages = collect_messages(&e);
        AppError::Validation(messages.join(", "))
    })?;

    let complaint = state.service.submit(image, dto.into_new_complaint()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(state.to_dto(complaint)),
            Some("Complaint submitted successfully.".to_string()),
            None,
        )),
    ))
}

/// List complaints, newest first
#[utoipa::path(
    get,
    path = "/api/employee/complaints",
    params(ComplaintListQuery),
    responses(
        (status = 200, description = "Complaints", body = ApiResponse<Vec<ComplaintResponseDto>>),
        (status = 400, description = "Unknown filter value"),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_cookie" = [])),
    tag = "employee"
)]
pub async fn list_complaints(
    _employee: AuthenticatedEmployee,
    State(state): State<ComplaintState>,
    Query(query): Query<ComplaintListQuery>,
) -> Result<Json<ApiResponse<Vec<ComplaintResponseDto>>>> {
    let filter = query.filter()?;
    let (complaints, total) = state.service.list(&filter, &query.pagination()).await?;
    let dtos = complaints.into_iter().map(|c| state.to_dto(c)).collect();

    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta { total }),
    )))
}

/// Get complaint by ID
#[utoipa::path(
    get,
    path = "/api/employee/complaints/{id}",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint found", body = ApiResponse<ComplaintResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Complaint not found")
    ),
    security(("session_cookie" = [])),
    tag = "employee"
)]
pub async fn get_complaint(
    _employee: AuthenticatedEmployee,
    State(state): State<ComplaintState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ComplaintResponseDto>>> {
    let complaint = state.service.get(id).await?;
    Ok(Json(ApiResponse::success(
        Some(state.to_dto(complaint)),
        None,
        None,
    )))
}

/// Mark a new complaint as in progress
#[utoipa::path(
    post,
    path = "/api/employee/complaints/{id}/start",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint in progress", body = ApiResponse<ComplaintResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Complaint not found"),
        (status = 409, description = "Complaint is not new")
    ),
    security(("session_cookie" = [])),
    tag = "employee"
)]
pub async fn start_complaint(
    employee: AuthenticatedEmployee,
    State(state): State<ComplaintState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ComplaintResponseDto>>> {
    let complaint = state.service.start(id).await?;
    tracing::info!("Employee {} started complaint {}", employee.id, id);

    Ok(Json(ApiResponse::success(
        Some(state.to_dto(complaint)),
        Some("Complaint marked as in progress.".to_string()),
        None,
    )))
}

/// Deny a complaint
#[utoipa::path(
    post,
    path = "/api/employee/complaints/{id}/deny",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint denied", body = ApiResponse<ComplaintResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Complaint not found"),
        (status = 409, description = "Complaint already resolved or denied")
    ),
    security(("session_cookie" = [])),
    tag = "employee"
)]
pub async fn deny_complaint(
    employee: AuthenticatedEmployee,
    State(state): State<ComplaintState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ComplaintResponseDto>>> {
    let complaint = state.service.deny(id).await?;
    tracing::info!("Employee {} denied complaint {}", employee.id, id);

    Ok(Json(ApiResponse::success(
        Some(state.to_dto(complaint)),
        Some("Complaint denied.".to_string()),
        None,
    )))
}

/// Resolve a complaint with a photo of the fix
#[utoipa::path(
    post,
    path = "/api/employee/complaints/{id}/resolve",
    params(("id" = Uuid, Path, description = "Complaint ID")),
    request_body(
        content = ResolveComplaintForm,
        content_type = "multipart/form-data",
    ),
    responses(
        (status = 200, description = "Complaint resolved", body = ApiResponse<ComplaintResponseDto>),
        (status = 400, description = "Missing or invalid image"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Complaint not found"),
        (status = 409, description = "Complaint already resolved or denied"),
        (status = 413, description = "Image too large")
    ),
    security(("session_cookie" = [])),
    tag = "employee"
)]
pub async fn resolve_complaint(
    employee: AuthenticatedEmployee,
    State(state): State<ComplaintState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ComplaintResponseDto>>> {
    let image = ComplaintForm::read(&mut multipart).await?.require_image()?;
    let complaint = state.service.resolve(id, image).await?;
    tracing::info!("Employee {} resolved complaint {}", employee.id, id);

    Ok(Json(ApiResponse::success(
        Some(state.to_dto(complaint)),
        Some("Complaint resolved.".to_string()),
        None,
    )))
}

/// Dashboard counters and chart series
#[utoipa::path(
    get,
    path = "/api/employee/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = ApiResponse<DashboardStatsDto>),
        (status = 401, description = "Unauthorized")
    ),
    security(("session_cookie" = [])),
    tag = "employee"
)]
pub async fn get_dashboard_stats(
    _employee: AuthenticatedEmployee,
    State(state): State<ComplaintState>,
) -> Result<Json<ApiResponse<DashboardStatsDto>>> {
    let stats = state.service.dashboard_stats().await?;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::complaints::routes;
    use crate::shared::test_helpers::{lazy_pool, MemoryStore};
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;

    fn test_server(store: Arc<MemoryStore>) -> TestServer {
        let state = ComplaintState {
            service: Arc::new(ComplaintService::new(lazy_pool(), store)),
            google_maps_api_key: None,
        };
        let app = routes::public_routes(state.clone()).merge(routes::employee_routes(state));
        TestServer::new(app).unwrap()
    }

    fn jpeg() -> Part {
        Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0])
            .file_name("pothole.jpg")
            .mime_type("image/jpeg")
    }

    fn complaint_form() -> MultipartForm {
        MultipartForm::new()
            .add_text("issue", "Deep pothole in the right lane")
            .add_text("location_description", "approx. 40.7128, -74.0060")
            .add_text("latitude", "40.7128")
            .add_text("longitude", "-74.0060")
            .add_text("category", "Pothole")
    }

    #[tokio::test]
    async fn test_submit_without_image_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let server = test_server(store.clone());

        let response = server
            .post("/api/complaints")
            .multipart(complaint_form())
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Please select an image");
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_submit_with_bad_coordinates_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let server = test_server(store.clone());

        let form = MultipartForm::new()
            .add_text("issue", "Graffiti on the bridge")
            .add_text("location_description", "Bridge")
            .add_text("latitude", "123.0")
            .add_text("longitude", "10.0")
            .add_part("image", jpeg());
        let response = server.post("/api/complaints").multipart(form).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "Latitude must be between -90 and 90");
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_submit_with_unsupported_image_type_is_rejected() {
        let store = Arc::new(MemoryStore::default());
        let server = test_server(store.clone());

        let form = complaint_form().add_part(
            "image",
            Part::bytes(b"%PDF-1.7".to_vec())
                .file_name("scan.pdf")
                .mime_type("application/pdf"),
        );
        let response = server.post("/api/complaints").multipart(form).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_failed_insert_removes_uploaded_photo() {
        let store = Arc::new(MemoryStore::default());
        let server = test_server(store.clone());

        let form = complaint_form().add_part("image", jpeg());
        let response = server.post("/api/complaints").multipart(form).await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.uploaded_count(), 1);
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_employee_routes_require_session() {
        let server = test_server(Arc::new(MemoryStore::default()));

        let response = server.get("/api/employee/complaints").await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

        let response = server
            .post(&format!("/api/employee/complaints/{}/deny", Uuid::new_v4()))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }
}
