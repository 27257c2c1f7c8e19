mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::auth::{routes as auth_routes, AuthService, SessionManager};
use crate::features::complaints::{routes as complaints_routes, ComplaintService, ComplaintState};
use crate::features::drafts::handlers::DraftState;
use crate::features::drafts::{routes as drafts_routes, ComplaintDrafter, VisionDrafter};
use crate::features::pages::{routes as pages_routes, PageState};
use crate::modules::storage::{ObjectStore, S3Storage};
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Sessions and employee accounts
    let sessions = Arc::new(SessionManager::new(&config.session));
    let auth_service = Arc::new(AuthService::new(pool.clone(), Arc::clone(&sessions)));

    if let Some(bootstrap) = &config.session.bootstrap_employee {
        let employee = auth_service
            .ensure_employee(bootstrap)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create bootstrap employee: {}", e))?;
        tracing::info!("Bootstrap employee {} is ready", employee.email);
    } else {
        tracing::info!("No bootstrap employee configured");
    }

    // Object storage for complaint photos
    let storage = S3Storage::connect(config.storage.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize object storage: {}", e))?;
    let storage: Arc<dyn ObjectStore> = Arc::new(storage);

    let complaint_service = Arc::new(ComplaintService::new(pool.clone(), storage));
    let complaint_state = ComplaintState {
        service: complaint_service,
        google_maps_api_key: config.app.google_maps_api_key.as_deref().map(Arc::from),
    };
    tracing::info!("Complaint service initialized");

    // Drafting is optional; without an API key the draft endpoint answers 503
    let drafter: Option<Arc<dyn ComplaintDrafter>> = match VisionDrafter::from_config(&config.ai)
        .map_err(|e| anyhow::anyhow!("Failed to initialize complaint drafter: {}", e))?
    {
        Some(drafter) => {
            tracing::info!("Complaint drafting enabled (model: {})", config.ai.model);
            Some(Arc::new(drafter))
        }
        None => {
            tracing::warn!("AI_API_KEY not set, complaint drafting is disabled");
            None
        }
    };

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };
    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn_with_state(
                Arc::new(credentials),
                middleware::basic_auth_middleware,
            ))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Employee API (401 without a session, never a redirect)
    let employee_routes = Router::new()
        .merge(auth_routes::protected_routes())
        .merge(complaints_routes::employee_routes(complaint_state.clone()))
        .route_layer(from_fn(middleware::require_employee));

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }

    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let public_routes = Router::new()
        .merge(auth_routes::public_routes(Arc::clone(&auth_service)))
        .merge(complaints_routes::public_routes(complaint_state.clone()))
        .merge(drafts_routes::routes(DraftState {
            drafter: drafter.clone(),
        }));

    let page_routes = pages_routes::routes(PageState {
        auth: auth_service,
        complaints: complaint_state,
        drafting_enabled: drafter.is_some(),
    });

    let body_limit = config.app.max_request_body_size;

    let app = Router::new()
        .merge(swagger)
        .merge(employee_routes)
        .merge(public_routes)
        .merge(page_routes)
        .merge(health_route)
        .layer(from_fn_with_state(sessions, middleware::session_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
