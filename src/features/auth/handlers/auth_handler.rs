use axum::{extract::State, Json};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{EmployeeDto, LoginRequestDto, INVALID_CREDENTIALS_MESSAGE};
use crate::features::auth::model::AuthenticatedEmployee;
use crate::features::auth::services::AuthService;
use crate::shared::types::ApiResponse;

/// Employee login; sets the session cookie on success
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = ApiResponse<EmployeeDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    jar: CookieJar,
    AppJson(dto): AppJson<LoginRequestDto>,
) -> Result<(CookieJar, Json<ApiResponse<EmployeeDto>>)> {
    dto.validate()
        .map_err(|_| AppError::Validation(INVALID_CREDENTIALS_MESSAGE.to_string()))?;

    let (employee, token) = service.login(dto).await?;
    let jar = jar.add(service.sessions().session_cookie(token));

    Ok((
        jar,
        Json(ApiResponse::success(Some(employee.into()), None, None)),
    ))
}

/// Clear the session cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = ApiResponse<bool>)
    ),
    tag = "auth"
)]
pub async fn logout(
    State(service): State<Arc<AuthService>>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<bool>>) {
    let jar = jar.remove(service.sessions().removal_cookie());
    (
        jar,
        Json(ApiResponse::success(
            Some(true),
            Some("You have been successfully logged out.".to_string()),
            None,
        )),
    )
}

/// Current employee
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current employee", body = ApiResponse<EmployeeDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(("session_cookie" = []))
)]
pub async fn get_me(employee: AuthenticatedEmployee) -> Json<ApiResponse<EmployeeDto>> {
    Json(ApiResponse::success(Some(employee.into()), None, None))
}
