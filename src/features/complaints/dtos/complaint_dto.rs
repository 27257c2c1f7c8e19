use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::complaints::models::{
    Complaint, ComplaintAction, ComplaintCategory, ComplaintStatus, Department, NewComplaint,
};
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::PaginationQuery;
use crate::shared::validation::{validate_latitude, validate_longitude};

/// Response DTO for a complaint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComplaintResponseDto {
    pub id: Uuid,
    pub issue: String,
    pub location_description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: String,
    pub resolution_image_url: Option<String>,
    pub category: ComplaintCategory,
    pub department: Department,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Actions the dashboard may offer; empty for resolved or denied complaints
    pub available_actions: Vec<ComplaintAction>,
    /// Google Maps embed URL for the coordinates, when maps are configured
    pub map_url: Option<String>,
}

impl ComplaintResponseDto {
    pub fn new(c: Complaint, google_maps_api_key: Option<&str>) -> Self {
        let map_url = google_maps_api_key.map(|key| map_embed_url(key, c.latitude, c.longitude));
        Self {
            available_actions: c.available_actions(),
            id: c.id,
            issue: c.issue,
            location_description: c.location_description,
            latitude: c.latitude,
            longitude: c.longitude,
            image_url: c.image_url,
            resolution_image_url: c.resolution_image_url,
            category: c.category,
            department: c.department,
            status: c.status,
            created_at: c.created_at,
            resolved_at: c.resolved_at,
            map_url,
        }
    }
}

pub fn map_embed_url(api_key: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "https://www.google.com/maps/embed/v1/place?key={}&q={},{}",
        urlencoding::encode(api_key),
        latitude,
        longitude
    )
}

/// Text fields of the citizen submission form (the photo travels alongside)
#[derive(Debug, Clone, Default, Validate)]
pub struct SubmitComplaintDto {
    #[validate(length(min = 1, max = 5000, message = "Please describe the issue"))]
    pub issue: String,

    #[validate(length(min = 1, max = 500, message = "Location description is required"))]
    pub location_description: String,

    #[validate(custom(function = "validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "validate_longitude"))]
    pub longitude: f64,

    pub category: Option<String>,
}

impl SubmitComplaintDto {
    pub fn into_new_complaint(self) -> NewComplaint {
        NewComplaint {
            issue: self.issue.trim().to_string(),
            location_description: self.location_description.trim().to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            category: ComplaintCategory::parse_or_other(self.category.as_deref()),
        }
    }
}

/// Multipart schema of `POST /api/complaints`, for the OpenAPI document
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct SubmitComplaintForm {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
    pub issue: String,
    pub location_description: String,
    pub latitude: f64,
    pub longitude: f64,
    /// One of the complaint categories; anything else is stored as Other
    pub category: Option<String>,
}

/// Multipart schema of `POST /api/employee/complaints/{id}/resolve`
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ResolveComplaintForm {
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
}

/// Query parameters for listing complaints
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ComplaintListQuery {
    /// New, In Progress, Resolved or Denied
    pub status: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
    /// Free-text search in issue and location
    pub q: Option<String>,
    #[param(minimum = 1)]
    pub page: Option<i64>,
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
}

/// Parsed list filters; `None` means "any"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplaintFilter {
    pub status: Option<ComplaintStatus>,
    pub category: Option<ComplaintCategory>,
    pub department: Option<Department>,
    pub q: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ComplaintListQuery {
    pub fn filter(&self) -> Result<ComplaintFilter, AppError> {
        let status = non_empty(&self.status)
            .map(|v| {
                ComplaintStatus::parse(v)
                    .ok_or_else(|| AppError::Validation(format!("Unknown status '{}'", v)))
            })
            .transpose()?;
        let category = non_empty(&self.category)
            .map(|v| {
                ComplaintCategory::parse(v)
                    .ok_or_else(|| AppError::Validation(format!("Unknown category '{}'", v)))
            })
            .transpose()?;
        let department = non_empty(&self.department)
            .map(|v| {
                Department::parse(v)
                    .ok_or_else(|| AppError::Validation(format!("Unknown department '{}'", v)))
            })
            .transpose()?;

        Ok(ComplaintFilter {
            status,
            category,
            department,
            q: non_empty(&self.q).map(str::to_string),
        })
    }

    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}
