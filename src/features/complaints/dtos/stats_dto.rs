use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::features::complaints::models::{
    CategoryStatusCount, ComplaintCategory, ComplaintStatus,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryCountDto {
    pub category: ComplaintCategory,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusCountDto {
    pub status: ComplaintStatus,
    pub count: i64,
}

/// Summary numbers and chart series for the employee dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStatsDto {
    pub total: i64,
    pub new: i64,
    pub in_progress: i64,
    pub resolved: i64,
    pub denied: i64,
    /// Sorted by count, largest first
    pub by_category: Vec<CategoryCountDto>,
    /// Always all four statuses in lifecycle order
    pub by_status: Vec<StatusCountDto>,
}

impl DashboardStatsDto {
    pub fn from_counts(rows: &[CategoryStatusCount]) -> Self {
        let total: i64 = rows.iter().map(|r| r.count).sum();
        let count_status = |status: ComplaintStatus| -> i64 {
            rows.iter()
                .filter(|r| r.status == status)
                .map(|r| r.count)
                .sum()
        };

        let new = count_status(ComplaintStatus::New);
        let resolved = count_status(ComplaintStatus::Resolved);
        let denied = count_status(ComplaintStatus::Denied);
        let in_progress = total - new - resolved - denied;

        let mut by_category: Vec<CategoryCountDto> = ComplaintCategory::ALL
            .into_iter()
            .map(|category| CategoryCountDto {
                category,
                count: rows
                    .iter()
                    .filter(|r| r.category == category)
                    .map(|r| r.count)
                    .sum(),
            })
            .filter(|c| c.count > 0)
            .collect();
        // stable sort keeps enum order for ties
        by_category.sort_by(|a, b| b.count.cmp(&a.count));

        let by_status = vec![
            StatusCountDto {
                status: ComplaintStatus::New,
                count: new,
            },
            StatusCountDto {
                status: ComplaintStatus::InProgress,
                count: in_progress,
            },
            StatusCountDto {
                status: ComplaintStatus::Resolved,
                count: resolved,
            },
            StatusCountDto {
                status: ComplaintStatus::Denied,
                count: denied,
            },
        ];

        Self {
            total,
            new,
            in_progress,
            resolved,
            denied,
            by_category,
            by_status,
        }
    }
}
