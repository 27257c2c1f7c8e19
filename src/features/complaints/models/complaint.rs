use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Complaint lifecycle status, stored as the `complaint_status` enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema, JsonSchema,
)]
#[sqlx(type_name = "complaint_status")]
pub enum ComplaintStatus {
    New,
    #[sqlx(rename = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Denied,
}

impl ComplaintStatus {
    /// Lifecycle order
    pub const ALL: [ComplaintStatus; 4] = [
        ComplaintStatus::New,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Denied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::New => "New",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Denied => "Denied",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Denied)
    }

    /// Actions an employee may take on a complaint in this status
    pub fn available_actions(&self) -> Vec<ComplaintAction> {
        match self {
            ComplaintStatus::New => vec![
                ComplaintAction::Start,
                ComplaintAction::Deny,
                ComplaintAction::Resolve,
            ],
            ComplaintStatus::InProgress => vec![ComplaintAction::Deny, ComplaintAction::Resolve],
            ComplaintStatus::Resolved | ComplaintStatus::Denied => Vec::new(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue category, stored as the `complaint_category` enum
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Type,
    ToSchema,
    JsonSchema,
)]
#[sqlx(type_name = "complaint_category")]
pub enum ComplaintCategory {
    Pothole,
    Graffiti,
    Trash,
    #[sqlx(rename = "Broken Streetlight")]
    #[serde(rename = "Broken Streetlight")]
    BrokenStreetlight,
    #[default]
    Other,
}

impl ComplaintCategory {
    pub const ALL: [ComplaintCategory; 5] = [
        ComplaintCategory::Pothole,
        ComplaintCategory::Graffiti,
        ComplaintCategory::Trash,
        ComplaintCategory::BrokenStreetlight,
        ComplaintCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintCategory::Pothole => "Pothole",
            ComplaintCategory::Graffiti => "Graffiti",
            ComplaintCategory::Trash => "Trash",
            ComplaintCategory::BrokenStreetlight => "Broken Streetlight",
            ComplaintCategory::Other => "Other",
        }
    }

    /// Department that handles this category
    pub fn department(&self) -> Department {
        match self {
            ComplaintCategory::Pothole | ComplaintCategory::BrokenStreetlight => {
                Department::PublicWorks
            }
            ComplaintCategory::Trash => Department::Sanitation,
            ComplaintCategory::Graffiti => Department::CommunityServices,
            ComplaintCategory::Other => Department::GeneralAdministration,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// Unknown or missing categories become `Other`
    pub fn parse_or_other(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }
}

impl std::fmt::Display for ComplaintCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Responsible department, stored as the `complaint_department` enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema, JsonSchema,
)]
#[sqlx(type_name = "complaint_department")]
pub enum Department {
    #[sqlx(rename = "Public Works")]
    #[serde(rename = "Public Works")]
    PublicWorks,
    Sanitation,
    #[sqlx(rename = "Community Services")]
    #[serde(rename = "Community Services")]
    CommunityServices,
    #[sqlx(rename = "General Administration")]
    #[serde(rename = "General Administration")]
    GeneralAdministration,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Department::PublicWorks,
        Department::Sanitation,
        Department::CommunityServices,
        Department::GeneralAdministration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::PublicWorks => "Public Works",
            Department::Sanitation => "Sanitation",
            Department::CommunityServices => "Community Services",
            Department::GeneralAdministration => "General Administration",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employee action on a complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintAction {
    Start,
    Deny,
    Resolve,
}

impl ComplaintAction {
    /// Status the complaint ends in after this action
    pub fn target_status(&self) -> ComplaintStatus {
        match self {
            ComplaintAction::Start => ComplaintStatus::InProgress,
            ComplaintAction::Deny => ComplaintStatus::Denied,
            ComplaintAction::Resolve => ComplaintStatus::Resolved,
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            ComplaintAction::Start => "started",
            ComplaintAction::Deny => "denied",
            ComplaintAction::Resolve => "resolved",
        }
    }

    pub fn is_allowed_from(&self, status: ComplaintStatus) -> bool {
        status.available_actions().contains(self)
    }
}

/// Database model for complaints
#[derive(Debug, Clone, FromRow)]
pub struct Complaint {
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
}

impl Complaint {
    pub fn available_actions(&self) -> Vec<ComplaintAction> {
        self.status.available_actions()
    }
}

/// Data for creating a complaint; the department always follows the category
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub issue: String,
    pub location_description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category: ComplaintCategory,
}

/// Row of the dashboard aggregation query
#[derive(Debug, Clone, FromRow)]
pub struct CategoryStatusCount {
    pub category: ComplaintCategory,
    pub status: ComplaintStatus,
    pub count: i64,
}
