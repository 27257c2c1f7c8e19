use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::middleware::{DASHBOARD_PATH, LOGIN_PATH};
use crate::features::auth::dtos::{LoginRequestDto, INVALID_CREDENTIALS_MESSAGE};
use crate::features::auth::{AuthService, AuthenticatedEmployee};
use crate::features::complaints::dtos::{ComplaintResponseDto, DashboardStatsDto};
use crate::features::complaints::handlers::form::ComplaintForm;
use crate::features::complaints::models::{
    Complaint, ComplaintAction, ComplaintCategory, ComplaintStatus, Department,
};
use crate::features::complaints::ComplaintState;
use crate::features::pages::dtos::{DashboardQuery, LoginForm, Toast, ToastKind};
use crate::shared::constants::{ALLOWED_IMAGE_TYPES, MAX_IMAGE_SIZE};
use crate::shared::templates::render_template;

/// State for HTML pages
#[derive(Clone)]
pub struct PageState {
    pub auth: Arc<AuthService>,
    pub complaints: ComplaintState,
    pub drafting_enabled: bool,
}

fn render(template: &str, ctx: serde_json::Value) -> Result<Html<String>> {
    render_template(template, ctx)
        .map(Html)
        .map_err(|e| AppError::Internal(format!("Failed to render {}: {}", template, e)))
}

fn category_names() -> Vec<&'static str> {
    ComplaintCategory::ALL.iter().map(|c| c.as_str()).collect()
}

pub async fn landing(employee: Option<AuthenticatedEmployee>) -> Result<Html<String>> {
    render("pages/landing.html", json!({ "employee": employee }))
}

/// Citizen report form
pub async fn report(
    State(state): State<PageState>,
    employee: Option<AuthenticatedEmployee>,
) -> Result<Html<String>> {
    render(
        "pages/report.html",
        json!({
            "employee": employee,
            "drafting_enabled": state.drafting_enabled,
            "categories": category_names(),
            "accepted_types": ALLOWED_IMAGE_TYPES,
            "max_image_size": MAX_IMAGE_SIZE,
        }),
    )
}

pub async fn login_page() -> Result<Html<String>> {
    render("pages/login.html", json!({}))
}

fn login_failed(status: StatusCode, email: &str, message: String) -> Result<Response> {
    let page = render(
        "pages/login.html",
        json!({ "email": email, "error": message }),
    )?;
    Ok((status, page).into_response())
}

/// Perform login from the portal form, then go to the dashboard
pub async fn login_submit(
    State(state): State<PageState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_string();
    let dto = LoginRequestDto {
        email: email.clone(),
        password: form.password,
    };

    if dto.validate().is_err() {
        return login_failed(
            StatusCode::BAD_REQUEST,
            &email,
            INVALID_CREDENTIALS_MESSAGE.to_string(),
        );
    }

    match state.auth.login(dto).await {
        Ok((_, token)) => {
            let jar = jar.add(state.auth.sessions().session_cookie(token));
            Ok((jar, Redirect::to(DASHBOARD_PATH)).into_response())
        }
        Err(e) => login_failed(e.status_code(), &email, e.public_message()),
    }
}

pub async fn logout(State(state): State<PageState>, jar: CookieJar) -> (CookieJar, Redirect) {
    (
        jar.remove(state.auth.sessions().removal_cookie()),
        Redirect::to(LOGIN_PATH),
    )
}

/// Stats, filters and the complaint table
pub async fn dashboard(
    State(state): State<PageState>,
    employee: AuthenticatedEmployee,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>> {
    let service = &state.complaints.service;
    let list_query = query.list_query();
    let pagination = list_query.pagination();
    let toast = query.toast();
    let notice = toast
        .filter(|t| t.kind() == ToastKind::Notice)
        .map(|t| t.message().to_string());
    let mut error = toast
        .filter(|t| t.kind() == ToastKind::Error)
        .map(|t| t.message().to_string());

    let (complaints, total) = match list_query.filter() {
        Ok(filter) => match service.list(&filter, &pagination).await {
            Ok(page) => page,
            Err(e) => {
                error.get_or_insert(e.public_message());
                (Vec::new(), 0)
            }
        },
        Err(e) => {
            error.get_or_insert(e.public_message());
            (Vec::new(), 0)
        }
    };

    let stats = match service.dashboard_stats().await {
        Ok(stats) => stats,
        Err(e) => {
            error.get_or_insert(e.public_message());
            DashboardStatsDto::from_counts(&[])
        }
    };

    let complaints: Vec<ComplaintResponseDto> = complaints
        .into_iter()
        .map(|c| state.complaints.to_dto(c))
        .collect();

    let page = pagination.page();
    let prev_page = (page > 1).then(|| query.page_link(page - 1));
    let next_page = pagination
        .has_next(total)
        .then(|| query.page_link(page.saturating_add(1)));

    render(
        "pages/dashboard.html",
        json!({
            "employee": employee,
            "error": error,
            "notice": notice,
            "stats": stats,
            "statuses": ComplaintStatus::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            "categories": category_names(),
            "departments": Department::ALL.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
            "filter": query.filter_view(),
            "total": total,
            "complaints": complaints,
            "accepted_types": ALLOWED_IMAGE_TYPES,
            "prev_page": prev_page,
            "next_page": next_page,
        }),
    )
}

/// Back to the dashboard with a toast describing the outcome
fn action_outcome(id: Uuid, action: ComplaintAction, result: Result<Complaint>) -> Redirect {
    let toast = match result {
        Ok(_) => Toast::succeeded(action),
        Err(e) => {
            let toast = Toast::failed(&e);
            if toast == Toast::Failed {
                tracing::error!("Dashboard action on complaint {} failed: {}", id, e);
            } else {
                tracing::debug!("Dashboard action on complaint {} rejected: {}", id, e);
            }
            toast
        }
    };
    Redirect::to(&toast.location())
}

pub async fn start_action(
    State(state): State<PageState>,
    _employee: AuthenticatedEmployee,
    Path(id): Path<Uuid>,
) -> Redirect {
    let result = state.complaints.service.start(id).await;
    action_outcome(id, ComplaintAction::Start, result)
}

pub async fn deny_action(
    State(state): State<PageState>,
    _employee: AuthenticatedEmployee,
    Path(id): Path<Uuid>,
) -> Redirect {
    let result = state.complaints.service.deny(id).await;
    action_outcome(id, ComplaintAction::Deny, result)
}

/// Resolve with the uploaded resolution photo
pub async fn resolve_action(
    State(state): State<PageState>,
    _employee: AuthenticatedEmployee,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Redirect {
    let result: Result<Complaint> = async {
        let mut form = ComplaintForm::read(&mut multipart).await?;
        let image = form.require_image()?;
        state.complaints.service.resolve(id, image).await
    }
    .await;

    action_outcome(id, ComplaintAction::Resolve, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::middleware::session_middleware;
    use crate::features::auth::SessionManager;
    use crate::features::complaints::ComplaintService;
    use crate::features::pages::routes;
    use crate::shared::test_helpers::{lazy_pool, test_employee, test_session_config, MemoryStore};
    use axum::http::{header, HeaderValue};
    use axum::middleware::from_fn_with_state;
    use axum_test::multipart::MultipartForm;
    use axum_test::TestServer;

    struct Harness {
        server: TestServer,
        session_cookie: HeaderValue,
        store: Arc<MemoryStore>,
    }

    fn harness(drafting_enabled: bool) -> Harness {
        let config = test_session_config();
        let sessions = Arc::new(SessionManager::new(&config));
        let store = Arc::new(MemoryStore::default());
        let pool = lazy_pool();

        let state = PageState {
            auth: Arc::new(AuthService::new(pool.clone(), Arc::clone(&sessions))),
            complaints: ComplaintState {
                service: Arc::new(ComplaintService::new(pool, store.clone())),
                google_maps_api_key: None,
            },
            drafting_enabled,
        };

        let token = sessions.issue(&test_employee()).unwrap();
        let session_cookie =
            HeaderValue::from_str(&format!("{}={}", config.cookie_name, token)).unwrap();

        let app = routes::routes(state).layer(from_fn_with_state(sessions, session_middleware));
        Harness {
            server: TestServer::new(app).unwrap(),
            session_cookie,
            store,
        }
    }

    fn location(response: &axum_test::TestResponse) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_landing_page_renders() {
        let h = harness(false);

        let response = h.server.get("/").await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Report an Issue"));
        assert!(html.contains("Employee Login"));
    }

    #[tokio::test]
    async fn test_report_page_hides_generate_without_drafter() {
        let disabled = harness(false).server.get("/report").await.text();
        let enabled = harness(true).server.get("/report").await.text();

        assert!(!disabled.contains("id=\"generate\""));
        assert!(enabled.contains("id=\"generate\""));
        assert!(enabled.contains("Broken Streetlight"));
        assert!(enabled.contains("const maxImageSize = 4194304;"));
    }

    #[tokio::test]
    async fn test_report_page_shows_signed_in_employee() {
        let h = harness(false);

        let response = h
            .server
            .get("/report")
            .add_header(header::COOKIE, h.session_cookie.clone())
            .await;

        assert!(response.text().contains("City Clerk"));
    }

    #[tokio::test]
    async fn test_login_with_malformed_email_rerenders_form() {
        let h = harness(false);

        let response = h
            .server
            .post(LOGIN_PATH)
            .form(&[("email", "not-an-email"), ("password", "secret")])
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let html = response.text();
        assert!(html.contains("Invalid email or password."));
        assert!(html.contains("value=\"not-an-email\""));
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_cookie_and_redirects() {
        let h = harness(false);

        let response = h
            .server
            .post("/employee/logout")
            .add_header(header::COOKIE, h.session_cookie.clone())
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), LOGIN_PATH);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("issuesnap_session="));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_dashboard_requires_session() {
        let h = harness(false);

        let response = h.server.get(DASHBOARD_PATH).await;

        assert_eq!(response.status_code(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), LOGIN_PATH);
    }

    #[tokio::test]
    async fn test_dashboard_renders_unknown_filter_as_toast() {
        let h = harness(false);

        let response = h
            .server
            .get(DASHBOARD_PATH)
            .add_query_param("status", "Bogus")
            .add_header(header::COOKIE, h.session_cookie.clone())
            .await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("Unknown status"));
        assert!(html.contains("City Clerk"));
    }

    #[tokio::test]
    async fn test_dashboard_renders_database_failure_as_toast() {
        let h = harness(false);

        let response = h
            .server
            .get(DASHBOARD_PATH)
            .add_header(header::COOKIE, h.session_cookie.clone())
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("Database error occurred"));
    }

    #[tokio::test]
    async fn test_dashboard_shows_only_known_toast_codes() {
        let h = harness(false);

        let known = h
            .server
            .get(DASHBOARD_PATH)
            .add_query_param("toast", "resolved")
            .add_header(header::COOKIE, h.session_cookie.clone())
            .await
            .text();
        let forged = h
            .server
            .get(DASHBOARD_PATH)
            .add_query_param("toast", "Your password expired, email it to us")
            .add_header(header::COOKIE, h.session_cookie.clone())
            .await
            .text();

        assert!(known.contains("Complaint resolved."));
        assert!(!forged.contains("password expired"));
    }

    #[tokio::test]
    async fn test_dashboard_survives_huge_page_number() {
        let h = harness(false);

        let response = h
            .server
            .get(DASHBOARD_PATH)
            .add_query_param("page", i64::MAX)
            .add_header(header::COOKIE, h.session_cookie.clone())
            .await;

        response.assert_status_ok();
        let html = response.text();
        assert!(html.contains("City Clerk"));
        assert!(!html.contains("page=-"));
    }

    #[tokio::test]
    async fn test_resolve_without_photo_redirects_with_error() {
        let h = harness(false);
        let id = Uuid::new_v4();

        let response = h
            .server
            .post(&format!("/employee/dashboard/complaints/{}/resolve", id))
            .add_header(header::COOKIE, h.session_cookie.clone())
            .multipart(MultipartForm::new().add_text("note", "fixed"))
            .await;

        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            "/employee/dashboard?toast=invalid_image"
        );
        assert!(h.store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_action_without_session_redirects_to_login() {
        let h = harness(false);

        let response = h
            .server
            .post(&format!("/employee/dashboard/complaints/{}/deny", Uuid::new_v4()))
            .await;

        assert_eq!(response.status_code(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), LOGIN_PATH);
    }
}
