use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::complaints::dtos::{ComplaintFilter, DashboardStatsDto};
use crate::features::complaints::models::{
    CategoryStatusCount, Complaint, ComplaintAction, NewComplaint,
};
use crate::modules::storage::{ImageUpload, ObjectStore};
use crate::shared::constants::RESOLUTION_KEY_PREFIX;
use crate::shared::types::PaginationQuery;

const COLUMNS: &str = "id, issue, location_description, latitude, longitude, image_url, \
     resolution_image_url, category, department, status, created_at, resolved_at";

const FILTER_CLAUSE: &str = "($1::complaint_status IS NULL OR status = $1) \
     AND ($2::complaint_category IS NULL OR category = $2) \
     AND ($3::complaint_department IS NULL OR department = $3) \
     AND ($4::text IS NULL OR issue ILIKE $4 OR location_description ILIKE $4)";

/// Statuses an action may start from, as a SQL predicate
fn source_status_predicate(action: ComplaintAction) -> &'static str {
    match action {
        ComplaintAction::Start => "status = 'New'",
        ComplaintAction::Deny | ComplaintAction::Resolve => "status IN ('New', 'In Progress')",
    }
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

pub struct ComplaintService {
    pool: PgPool,
    storage: Arc<dyn ObjectStore>,
}

impl ComplaintService {
    pub fn new(pool: PgPool, storage: Arc<dyn ObjectStore>) -> Self {
        Self { pool, storage }
    }

    /// Store the photo and create a complaint in status New
    pub async fn submit(&self, image: ImageUpload, data: NewComplaint) -> Result<Complaint> {
        image.validate()?;

        let key = image.object_key("");
        let image_url = self
            .storage
            .upload(&key, image.data, &image.content_type)
            .await?;

        let sql = format!(
            "INSERT INTO complaints \
                 (issue, location_description, latitude, longitude, image_url, category, department, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'New') \
             RETURNING {COLUMNS}"
        );

        let result = sqlx::query_as::<_, Complaint>(&sql)
            .bind(&data.issue)
            .bind(&data.location_description)
            .bind(data.latitude)
            .bind(data.longitude)
            .bind(&image_url)
            .bind(data.category)
            .bind(data.category.department())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(complaint) => {
                tracing::info!(
                    "Complaint {} created ({}, {})",
                    complaint.id,
                    complaint.category,
                    complaint.department
                );
                Ok(complaint)
            }
            Err(e) => {
                tracing::error!("Failed to insert complaint: {:?}", e);
                self.discard_upload(&key).await;
                Err(AppError::Database(e))
            }
        }
    }

    /// Newest first, with optional filters
    pub async fn list(
        &self,
        filter: &ComplaintFilter,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<Complaint>, i64)> {
        let pattern = filter.q.as_deref().map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM complaints WHERE {FILTER_CLAUSE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.status)
            .bind(filter.category)
            .bind(filter.department)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count complaints: {:?}", e);
                AppError::Database(e)
            })?;

        let list_sql = format!(
            "SELECT {COLUMNS} FROM complaints WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC OFFSET $5 LIMIT $6"
        );
        let complaints = sqlx::query_as::<_, Complaint>(&list_sql)
            .bind(filter.status)
            .bind(filter.category)
            .bind(filter.department)
            .bind(pattern.as_deref())
            .bind(pagination.offset())
            .bind(pagination.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list complaints: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((complaints, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Complaint> {
        let sql = format!("SELECT {COLUMNS} FROM complaints WHERE id = $1");
        sqlx::query_as::<_, Complaint>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Complaint {} not found", id)))
    }

    /// New -> In Progress
    pub async fn start(&self, id: Uuid) -> Result<Complaint> {
        self.update_status(id, ComplaintAction::Start).await
    }

    /// New | In Progress -> Denied
    pub async fn deny(&self, id: Uuid) -> Result<Complaint> {
        self.update_status(id, ComplaintAction::Deny).await
    }

    /// New | In Progress -> Resolved, with a photo of the fix
    pub async fn resolve(&self, id: Uuid, image: ImageUpload) -> Result<Complaint> {
        image.validate()?;

        let current = self.get(id).await?;
        if !ComplaintAction::Resolve.is_allowed_from(current.status) {
            return Err(Self::rejected(ComplaintAction::Resolve, &current));
        }

        let key = image.object_key(RESOLUTION_KEY_PREFIX);
        let image_url = self
            .storage
            .upload(&key, image.data, &image.content_type)
            .await?;

        let sql = format!(
            "UPDATE complaints \
             SET status = 'Resolved', resolution_image_url = $2, resolved_at = NOW() \
             WHERE id = $1 AND {} \
             RETURNING {COLUMNS}",
            source_status_predicate(ComplaintAction::Resolve)
        );

        let updated = sqlx::query_as::<_, Complaint>(&sql)
            .bind(id)
            .bind(&image_url)
            .fetch_optional(&self.pool)
            .await;

        match updated {
            Ok(Some(complaint)) => {
                tracing::info!("Complaint {} resolved", id);
                Ok(complaint)
            }
            Ok(None) => {
                self.discard_upload(&key).await;
                Err(self.explain_rejection(id, ComplaintAction::Resolve).await)
            }
            Err(e) => {
                tracing::error!("Failed to resolve complaint {}: {:?}", id, e);
                self.discard_upload(&key).await;
                Err(AppError::Database(e))
            }
        }
    }

    /// Counts grouped by category and status for the dashboard
    pub async fn dashboard_stats(&self) -> Result<DashboardStatsDto> {
        let rows = sqlx::query_as::<_, CategoryStatusCount>(
            "SELECT category, status, COUNT(*) AS count FROM complaints GROUP BY category, status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to aggregate complaint stats: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(DashboardStatsDto::from_counts(&rows))
    }

    async fn update_status(&self, id: Uuid, action: ComplaintAction) -> Result<Complaint> {
        let sql = format!(
            "UPDATE complaints SET status = $2 WHERE id = $1 AND {} RETURNING {COLUMNS}",
            source_status_predicate(action)
        );

        let updated = sqlx::query_as::<_, Complaint>(&sql)
            .bind(id)
            .bind(action.target_status())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update complaint {}: {:?}", id, e);
                AppError::Database(e)
            })?;

        match updated {
            Some(complaint) => {
                tracing::info!("Complaint {} {}", id, action.past_tense());
                Ok(complaint)
            }
            None => Err(self.explain_rejection(id, action).await),
        }
    }

    /// Why an atomic update matched no row: missing, or in the wrong status
    async fn explain_rejection(&self, id: Uuid, action: ComplaintAction) -> AppError {
        match self.get(id).await {
            Ok(current) => Self::rejected(action, &current),
            Err(e) => e,
        }
    }

    fn rejected(action: ComplaintAction, complaint: &Complaint) -> AppError {
        tracing::debug!(
            "Rejected {:?} on complaint {} in status {}",
            action,
            complaint.id,
            complaint.status
        );
        AppError::Conflict(format!(
            "Complaint cannot be {} while {}",
            action.past_tense(),
            complaint.status
        ))
    }

    async fn discard_upload(&self, key: &str) {
        if let Err(e) = self.storage.delete(key).await {
            tracing::warn!("Failed to remove orphaned upload '{}': {}", key, e);
        }
    }
}
