use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::core::config::SessionConfig;
use crate::features::auth;
use crate::features::complaints::{
    dtos as complaints_dtos, handlers as complaints_handlers, models as complaints_models,
};
use crate::features::drafts::{dtos as drafts_dtos, handlers as drafts_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::login,
        auth::handlers::logout,
        auth::handlers::get_me,
        // Complaints (public)
        drafts_handlers::draft_complaint,
        complaints_handlers::submit_complaint,
        // Employee
        complaints_handlers::list_complaints,
        complaints_handlers::get_complaint,
        complaints_handlers::start_complaint,
        complaints_handlers::deny_complaint,
        complaints_handlers::resolve_complaint,
        complaints_handlers::get_dashboard_stats,
    ),
    components(
        schemas(
            Meta,
            ApiResponse<bool>,
            // Auth
            auth::dtos::LoginRequestDto,
            auth::dtos::EmployeeDto,
            ApiResponse<auth::dtos::EmployeeDto>,
            // Complaints
            complaints_models::ComplaintStatus,
            complaints_models::ComplaintCategory,
            complaints_models::Department,
            complaints_models::ComplaintAction,
            complaints_dtos::ComplaintResponseDto,
            complaints_dtos::SubmitComplaintForm,
            complaints_dtos::ResolveComplaintForm,
            complaints_dtos::CategoryCountDto,
            complaints_dtos::StatusCountDto,
            complaints_dtos::DashboardStatsDto,
            ApiResponse<complaints_dtos::ComplaintResponseDto>,
            ApiResponse<Vec<complaints_dtos::ComplaintResponseDto>>,
            ApiResponse<complaints_dtos::DashboardStatsDto>,
            // Drafts
            drafts_dtos::GenerateComplaintDto,
            drafts_dtos::ComplaintDraftDto,
            ApiResponse<drafts_dtos::ComplaintDraftDto>,
        )
    ),
    tags(
        (name = "auth", description = "Employee login and session"),
        (name = "complaints", description = "Citizen complaint submission (public)"),
        (name = "drafts", description = "AI complaint drafting from a photo (public)"),
        (name = "employee", description = "Complaint management for city employees"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "IssueSnap API",
        version = "0.1.0",
        description = "Citizen complaint reporting API",
    )
)]
pub struct ApiDoc;

/// Adds the session cookie security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    SessionConfig::DEFAULT_COOKIE_NAME,
                ))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
