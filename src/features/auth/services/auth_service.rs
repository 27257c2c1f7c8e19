use sqlx::PgPool;
use std::sync::Arc;

use crate::core::config::BootstrapEmployee;
use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{LoginRequestDto, INVALID_CREDENTIALS_MESSAGE};
use crate::features::auth::model::{AuthenticatedEmployee, Employee};
use crate::features::auth::password::{hash_password, verify_password};
use crate::features::auth::session::SessionManager;

/// Employee sign-in backed by the employees table
pub struct AuthService {
    pool: PgPool,
    sessions: Arc<SessionManager>,
}

impl AuthService {
    pub fn new(pool: PgPool, sessions: Arc<SessionManager>) -> Self {
        Self { pool, sessions }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Verify credentials and issue a session token
    pub async fn login(&self, dto: LoginRequestDto) -> Result<(AuthenticatedEmployee, String)> {
        let employee = self
            .find_by_email(&dto.email)
            .await?
            .filter(|e| e.is_active)
            .ok_or_else(|| {
                tracing::debug!("Login rejected for unknown or inactive account");
                AppError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string())
            })?;

        let password = dto.password;
        let hash = employee.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
            .map_err(|e| {
                AppError::Internal(format!(
                    "Stored password hash for employee {} is unreadable: {}",
                    employee.id, e
                ))
            })?;

        if !valid {
            tracing::debug!("Login rejected for employee {}: wrong password", employee.id);
            return Err(AppError::Unauthorized(
                INVALID_CREDENTIALS_MESSAGE.to_string(),
            ));
        }

        let authenticated = AuthenticatedEmployee::from(&employee);
        let token = self.sessions.issue(&authenticated)?;

        tracing::info!("Employee {} logged in", employee.id);
        Ok((authenticated, token))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, email, password_hash, display_name, is_active, created_at
            FROM employees
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up employee: {:?}", e);
            AppError::Database(e)
        })
    }

    /// Create or update the configured bootstrap employee
    pub async fn ensure_employee(&self, bootstrap: &BootstrapEmployee) -> Result<Employee> {
        let password = bootstrap.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hash task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (email, password_hash, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT ((LOWER(email))) DO UPDATE
            SET password_hash = EXCLUDED.password_hash,
                display_name = EXCLUDED.display_name,
                is_active = TRUE
            RETURNING id, email, password_hash, display_name, is_active, created_at
            "#,
        )
        .bind(bootstrap.email.trim())
        .bind(password_hash)
        .bind(&bootstrap.display_name)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Bootstrap employee {} ready", employee.email);
        Ok(employee)
    }
}
