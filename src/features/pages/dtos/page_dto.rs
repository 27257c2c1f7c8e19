use serde::{Deserialize, Serialize};

use crate::core::error::AppError;
use crate::core::middleware::DASHBOARD_PATH;
use crate::features::complaints::dtos::ComplaintListQuery;
use crate::features::complaints::models::ComplaintAction;

/// Login form posted by the employee portal
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Dashboard query string: list filters plus the toast left by a redirect
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub department: Option<String>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub toast: Option<String>,
}

/// Current filter values echoed back into the filter form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterView {
    pub status: String,
    pub category: String,
    pub department: String,
    pub q: String,
}

impl DashboardQuery {
    pub fn list_query(&self) -> ComplaintListQuery {
        ComplaintListQuery {
            status: self.status.clone(),
            category: self.category.clone(),
            department: self.department.clone(),
            q: self.q.clone(),
            page: self.page,
            page_size: None,
        }
    }

    pub fn filter_view(&self) -> FilterView {
        let value = |v: &Option<String>| v.as_deref().unwrap_or("").trim().to_string();
        FilterView {
            status: value(&self.status),
            category: value(&self.category),
            department: value(&self.department),
            q: value(&self.q),
        }
    }

    /// Dashboard link to another page keeping the current filters
    pub fn page_link(&self, page: i64) -> String {
        let filter = self.filter_view();
        let mut params: Vec<String> = [
            ("status", &filter.status),
            ("category", &filter.category),
            ("department", &filter.department),
            ("q", &filter.q),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect();
        params.push(format!("page={}", page));

        format!("{}?{}", DASHBOARD_PATH, params.join("&"))
    }

    /// Toast named by the `toast` code; unknown codes show nothing
    pub fn toast(&self) -> Option<Toast> {
        self.toast.as_deref().and_then(Toast::from_code)
    }
}

/// Outcome of a dashboard action, carried across the redirect as a fixed code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toast {
    Started,
    Denied,
    Resolved,
    NotFound,
    Conflict,
    InvalidImage,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Notice,
    Error,
}

impl Toast {
    const ALL: [Toast; 7] = [
        Toast::Started,
        Toast::Denied,
        Toast::Resolved,
        Toast::NotFound,
        Toast::Conflict,
        Toast::InvalidImage,
        Toast::Failed,
    ];

    pub fn succeeded(action: ComplaintAction) -> Self {
        match action {
            ComplaintAction::Start => Toast::Started,
            ComplaintAction::Deny => Toast::Denied,
            ComplaintAction::Resolve => Toast::Resolved,
        }
    }

    pub fn failed(error: &AppError) -> Self {
        match error {
            AppError::NotFound(_) => Toast::NotFound,
            AppError::Conflict(_) => Toast::Conflict,
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::PayloadTooLarge(_) => {
                Toast::InvalidImage
            }
            _ => Toast::Failed,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Toast::Started => "started",
            Toast::Denied => "denied",
            Toast::Resolved => "resolved",
            Toast::NotFound => "not_found",
            Toast::Conflict => "conflict",
            Toast::InvalidImage => "invalid_image",
            Toast::Failed => "failed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn kind(&self) -> ToastKind {
        match self {
            Toast::Started | Toast::Denied | Toast::Resolved => ToastKind::Notice,
            _ => ToastKind::Error,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Toast::Started => "Complaint marked in progress.",
            Toast::Denied => "Complaint denied.",
            Toast::Resolved => "Complaint resolved.",
            Toast::NotFound => "That complaint no longer exists.",
            Toast::Conflict => "That complaint is already closed or in progress.",
            Toast::InvalidImage => "Please select a JPEG, PNG, GIF or WebP photo up to 4 MB.",
            Toast::Failed => "The action failed. Please try again.",
        }
    }

    /// Redirect target that shows this toast on the dashboard
    pub fn location(&self) -> String {
        format!("{}?toast={}", DASHBOARD_PATH, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_link_keeps_filters() {
        let query = DashboardQuery {
            status: Some("In Progress".to_string()),
            category: Some(String::new()),
            q: Some(" main st ".to_string()),
            page: Some(1),
            ..Default::default()
        };

        assert_eq!(
            query.page_link(2),
            "/employee/dashboard?status=In%20Progress&q=main%20st&page=2"
        );
    }

    #[test]
    fn test_list_query_uses_default_page_size() {
        let query = DashboardQuery {
            department: Some("Sanitation".to_string()),
            page: Some(3),
            ..Default::default()
        };
        let list = query.list_query();

        assert_eq!(list.department.as_deref(), Some("Sanitation"));
        assert_eq!(list.pagination().page, 3);
        assert_eq!(list.page_size, None);
    }

    #[test]
    fn test_toast_codes_resolve_to_fixed_messages() {
        let query = DashboardQuery {
            toast: Some("denied".to_string()),
            ..Default::default()
        };
        let toast = query.toast().unwrap();

        assert_eq!(toast, Toast::Denied);
        assert_eq!(toast.kind(), ToastKind::Notice);
        assert_eq!(toast.location(), "/employee/dashboard?toast=denied");

        for toast in Toast::ALL {
            assert_eq!(Toast::from_code(toast.code()), Some(toast));
        }
    }

    #[test]
    fn test_free_text_toast_is_ignored() {
        let query = DashboardQuery {
            toast: Some("Your account was suspended, call 555-0100".to_string()),
            ..Default::default()
        };
        assert_eq!(query.toast(), None);
    }

    #[test]
    fn test_toast_for_failures() {
        assert_eq!(
            Toast::failed(&AppError::Conflict("closed".to_string())),
            Toast::Conflict
        );
        assert_eq!(
            Toast::failed(&AppError::Validation("no image".to_string())),
            Toast::InvalidImage
        );
        assert_eq!(
            Toast::failed(&AppError::Internal("boom".to_string())),
            Toast::Failed
        );
        assert_eq!(Toast::failed(&AppError::Conflict(String::new())).kind(), ToastKind::Error);
        assert_eq!(Toast::succeeded(ComplaintAction::Start), Toast::Started);
    }
}
