use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, Uri};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{Config, MediaConfig, ServerConfig};
use crate::errors::{ApiError, not_found};
use crate::state::AppState;
use crate::{about, auth, dashboard, message, project, sale_project, skill};

pub const API_VERSION: &str = "1.0.0";

async fn banner() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Portfolio API Server",
        "version": API_VERSION,
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "API is running",
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.environment.as_str(),
    }))
}

async fn fallback(uri: Uri) -> ApiError {
    not_found(format!("Not Found - {uri}"))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
}

/// Resource routes only; no CORS, tracing or static files.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::handlers::routes())
        .nest("/projects", project::routes())
        .nest("/sale-projects", sale_project::routes())
        .nest("/skills", skill::routes())
        .nest("/about", about::routes())
        .nest("/messages", message::routes())
        .nest("/dashboard", dashboard::routes())
}

pub fn build_api_router(state: AppState, config: &Config) -> Result<Router> {
    let mut router = Router::new()
        .route("/", get(banner))
        .nest("/api", api_routes());

    if let MediaConfig::Local { root, public_base } = &config.media {
        let root = crate::db::normalize_path(root)?;
        let mount = if public_base.starts_with('/') {
            public_base.clone()
        } else {
            "/media".to_string()
        };
        router = router.nest_service(&mount, ServeDir::new(root));
    }

    let body_limit = config.server.body_limit_mb * 1024 * 1024;
    Ok(router
        .fallback(fallback)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer(&config.server))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

pub async fn run_api(state: AppState, config: &Config, shutdown: CancellationToken) -> Result<()> {
    let router = build_api_router(state, config)?;
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        environment = config.server.environment.as_str(),
        "folio API listening"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await?;
    Ok(())
}

