use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::session::SessionClaims;

/// Employee resolved from a valid session cookie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedEmployee {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

impl From<&SessionClaims> for AuthenticatedEmployee {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email.clone(),
            display_name: claims.name.clone(),
        }
    }
}

impl From<&Employee> for AuthenticatedEmployee {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            email: employee.email.clone(),
            display_name: employee.display_name.clone(),
        }
    }
}

/// Database model for employees
#[derive(Debug, Clone, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
