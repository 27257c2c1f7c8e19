use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::auth::model::AuthenticatedEmployee;

/// Message used for every login failure so accounts cannot be enumerated
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password.";

/// Employee login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(email)]
    #[schema(example = "clerk@city.gov")]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// Employee returned by login and /me
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeDto {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

impl From<AuthenticatedEmployee> for EmployeeDto {
    fn from(employee: AuthenticatedEmployee) -> Self {
        Self {
            id: employee.id,
            email: employee.email,
            display_name: employee.display_name,
        }
    }
}
