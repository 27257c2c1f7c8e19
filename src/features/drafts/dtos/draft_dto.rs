use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::complaints::models::{ComplaintCategory, Department};
use crate::shared::validation::validate_image_data_uri;

/// Photo and location to draft a complaint from
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct GenerateComplaintDto {
    /// `data:<mime>;base64,<data>` image
    #[validate(custom(function = "validate_image_data_uri"))]
    pub photo_data_uri: String,

    /// e.g. "approx. 40.7128, -74.0060"
    #[validate(length(min = 1, max = 500, message = "Location description is required"))]
    pub location_description: String,
}

/// AI-drafted complaint, ready for the citizen to review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComplaintDraftDto {
    pub complaint_draft: String,
    pub category: ComplaintCategory,
    /// Always the department mapped from the category
    pub department: Department,
}
