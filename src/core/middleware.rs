use crate::core::error::AppError;
use crate::features::auth::{AuthenticatedEmployee, SessionManager};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

pub const LOGIN_PATH: &str = "/employee/login";
pub const DASHBOARD_PATH: &str = "/employee/dashboard";

const STATIC_EXTENSIONS: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::now_v7().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Basic auth guard for the Swagger UI
pub async fn basic_auth_middleware(
    State(credentials): State<Arc<String>>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .is_some_and(|creds| creds == *credentials);

    if authorized {
        return next.run(req).await;
    }

    let mut response = (StatusCode::UNAUTHORIZED, Body::from("Unauthorized")).into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"Swagger UI\""),
    );
    response
}

/// Paths the session layer ignores (static files and images)
pub fn is_static_asset(path: &str) -> bool {
    if path.starts_with("/static/") || path == "/favicon.ico" {
        return true;
    }
    let lower = path.to_ascii_lowercase();
    STATIC_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn response_sets_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{}=", name);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}

/// Session cookie handling for every non-static request.
///
/// - refreshes a valid session that is close to expiry, up to its hard
///   expiry counted from login
/// - clears an invalid or expired session cookie
/// - exposes the employee to handlers via request extensions
/// - redirects dashboard pages to the login page when there is no session,
///   and the login page to the dashboard when there is one
pub async fn session_middleware(
    State(sessions): State<Arc<SessionManager>>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if is_static_asset(&path) {
        return next.run(req).await;
    }

    let jar = CookieJar::from_headers(req.headers());
    let token = jar
        .get(sessions.cookie_name())
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty());

    let (employee, jar) = match token {
        None => (None, jar),
        Some(token) => match sessions.validate(&token) {
            Ok(claims) => {
                let employee = AuthenticatedEmployee::from(&claims);
                let now = chrono::Utc::now().timestamp();
                if sessions.needs_refresh(&claims, now) {
                    match sessions.refresh(&claims, now) {
                        Ok(fresh) => {
                            tracing::debug!("Refreshed session for employee {}", employee.id);
                            (Some(employee), jar.add(sessions.session_cookie(fresh)))
                        }
                        Err(e) => {
                            tracing::warn!("Failed to refresh session: {}", e);
                            (Some(employee), jar)
                        }
                    }
                } else {
                    (Some(employee), jar)
                }
            }
            Err(_) => (None, jar.remove(sessions.removal_cookie())),
        },
    };

    if path.starts_with(DASHBOARD_PATH) && employee.is_none() {
        return (jar, Redirect::temporary(LOGIN_PATH)).into_response();
    }

    if path == LOGIN_PATH && req.method() == Method::GET && employee.is_some() {
        return (jar, Redirect::temporary(DASHBOARD_PATH)).into_response();
    }

    if let Some(employee) = employee {
        req.extensions_mut().insert(employee);
    }

    let response = next.run(req).await;

    // login/logout handlers set the cookie themselves and take precedence
    if response_sets_cookie(&response, sessions.cookie_name()) {
        return response;
    }

    (jar, response).into_response()
}

/// Guard for JSON API routes: 401 instead of a redirect
pub async fn require_employee(req: Request, next: Next) -> Result<Response, AppError> {
    if req.extensions().get::<AuthenticatedEmployee>().is_none() {
        return Err(AppError::Unauthorized("Authentication required".to_string()));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SessionConfig;
    use crate::shared::test_helpers::{test_employee, test_session_config};
    use axum::{
        http::HeaderName,
        middleware::{from_fn, from_fn_with_state},
        routing::{get, post},
        Router,
    };
    use axum_extra::extract::cookie::CookieJar as HandlerJar;
    use axum_test::TestServer;
    use std::time::Duration;

    async fn whoami(req: Request) -> String {
        req.extensions()
            .get::<AuthenticatedEmployee>()
            .map(|e| e.email.clone())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn test_server(config: &SessionConfig) -> TestServer {
        let sessions = Arc::new(SessionManager::new(config));
        let logout_sessions = Arc::clone(&sessions);

        let api = Router::new()
            .route("/api/employee/ping", get(|| async { "pong" }))
            .route_layer(from_fn(require_employee));

        let app = Router::new()
            .route("/", get(whoami))
            .route(DASHBOARD_PATH, get(whoami))
            .route(LOGIN_PATH, get(|| async { "login form" }))
            .route(
                "/logout",
                post(move |jar: HandlerJar| async move {
                    jar.remove(logout_sessions.removal_cookie())
                }),
            )
            .route("/static/app.css", get(|| async { "body {}" }))
            .merge(api)
            .layer(from_fn_with_state(sessions, session_middleware));

        TestServer::new(app).unwrap()
    }

    fn cookie_header(name: &str, token: &str) -> (HeaderName, HeaderValue) {
        (
            header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", name, token)).unwrap(),
        )
    }

    fn set_cookies(response: &axum_test::TestResponse) -> Vec<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_is_static_asset() {
        assert!(is_static_asset("/static/app.js"));
        assert!(is_static_asset("/favicon.ico"));
        assert!(is_static_asset("/images/hero.PNG"));
        assert!(!is_static_asset("/employee/dashboard"));
        assert!(!is_static_asset("/report"));
    }

    #[tokio::test]
    async fn test_dashboard_without_session_redirects_to_login() {
        let server = test_server(&test_session_config());

        let response = server.get(DASHBOARD_PATH).await;

        assert_eq!(response.status_code(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            LOGIN_PATH
        );
    }

    #[tokio::test]
    async fn test_dashboard_with_session_is_served() {
        let config = test_session_config();
        let server = test_server(&config);
        let token = SessionManager::new(&config).issue(&test_employee()).unwrap();
        let (name, value) = cookie_header(&config.cookie_name, &token);

        let response = server.get(DASHBOARD_PATH).add_header(name, value).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), test_employee().email);
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_login_page_with_session_redirects_to_dashboard() {
        let config = test_session_config();
        let server = test_server(&config);
        let token = SessionManager::new(&config).issue(&test_employee()).unwrap();
        let (name, value) = cookie_header(&config.cookie_name, &token);

        let response = server.get(LOGIN_PATH).add_header(name, value).await;

        assert_eq!(response.status_code(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            DASHBOARD_PATH
        );
    }

    #[tokio::test]
    async fn test_invalid_cookie_is_cleared_on_public_page() {
        let config = test_session_config();
        let server = test_server(&config);
        let (name, value) = cookie_header(&config.cookie_name, "forged-token");

        let response = server.get("/").add_header(name, value).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "anonymous");
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("issuesnap_session="));
        assert!(cookies[0].contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_session_near_expiry_is_refreshed() {
        let config = test_session_config();
        let server = test_server(&config);

        // ten minute token is inside the one hour refresh window
        let mut short_config = test_session_config();
        short_config.ttl = Duration::from_secs(600);
        short_config.refresh_threshold = Duration::from_secs(60);
        let token = SessionManager::new(&short_config)
            .issue(&test_employee())
            .unwrap();
        let (name, value) = cookie_header(&config.cookie_name, &token);

        let response = server.get("/").add_header(name, value).await;

        assert_eq!(response.text(), test_employee().email);
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("issuesnap_session="));
        assert!(!cookies[0].contains(&token));
        assert!(cookies[0].contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_session_at_max_lifetime_is_not_extended() {
        let mut config = test_session_config();
        config.ttl = Duration::from_secs(600);
        config.refresh_threshold = Duration::from_secs(900);
        config.max_lifetime = Duration::from_secs(600);
        let server = test_server(&config);
        let token = SessionManager::new(&config).issue(&test_employee()).unwrap();
        let (name, value) = cookie_header(&config.cookie_name, &token);

        let response = server.get("/").add_header(name, value).await;

        assert_eq!(response.text(), test_employee().email);
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn test_session_below_max_lifetime_is_extended() {
        let mut config = test_session_config();
        config.ttl = Duration::from_secs(600);
        config.refresh_threshold = Duration::from_secs(900);
        config.max_lifetime = Duration::from_secs(3600);
        let server = test_server(&config);
        let sessions = SessionManager::new(&config);
        let token = sessions.issue(&test_employee()).unwrap();
        let (name, value) = cookie_header(&config.cookie_name, &token);

        let response = server.get("/").add_header(name, value).await;

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        let fresh = cookies[0]
            .trim_start_matches("issuesnap_session=")
            .split(';')
            .next()
            .unwrap();
        let original = sessions.validate(&token).unwrap();
        let refreshed = sessions.validate(fresh).unwrap();
        assert_eq!(refreshed.auth_time, original.auth_time);
    }

    #[tokio::test]
    async fn test_handler_cookie_wins_over_refresh() {
        let config = test_session_config();
        let server = test_server(&config);
        let mut short_config = test_session_config();
        short_config.ttl = Duration::from_secs(600);
        short_config.refresh_threshold = Duration::from_secs(60);
        let token = SessionManager::new(&short_config)
            .issue(&test_employee())
            .unwrap();
        let (name, value) = cookie_header(&config.cookie_name, &token);

        let response = server.post("/logout").add_header(name, value).await;

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_api_guard_answers_401_without_session() {
        let server = test_server(&test_session_config());

        let response = server.get("/api/employee/ping").await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_static_assets_skip_session_handling() {
        let config = test_session_config();
        let server = test_server(&config);
        let (name, value) = cookie_header(&config.cookie_name, "forged-token");

        let response = server.get("/static/app.css").add_header(name, value).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(set_cookies(&response).is_empty());
    }
}
