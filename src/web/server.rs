//! Axum web server for Job Creator
//!
//! Serves the token, compile and preview endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::error::ApiError;
use super::service::{self, PreviewResponse};
use crate::auth::AuthToken;
use crate::config::Settings;

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(_)) => {
            warn!(origin = ?origin, "ignoring invalid CORS origin");
            AllowOrigin::any()
        }
        None => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build the axum router with all routes
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.settings.server.cors_origin.as_deref());

    Router::new()
        .route("/auth", post(auth_handler))
        .route("/api/model", post(model_handler))
        .route("/api/generate-query", post(preview_handler))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn serve(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let addr = settings.bind_address();
    let app = router(AppState::new(settings));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Starting Job Creator API on {}", addr);
    info!("  POST /auth               - Issue a bearer token");
    info!("  POST /api/model          - Compile a query request");
    info!("  POST /api/generate-query - Preview a query");
    info!("  GET  /api/health         - Health check");

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Serialize)]
struct ModelResponse {
    sql: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// POST /auth - Issue a token for any complete set of credentials
async fn auth_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AuthToken>, ApiError> {
    service::authenticate(&state.settings, &body).await.map(Json)
}

/// POST /api/model - Compile a request to SQL
async fn model_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ModelResponse>, ApiError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let output = service::generate_model(&state.settings, authorization, &body).await?;
    Ok(Json(ModelResponse { sql: output.sql }))
}

/// POST /api/generate-query - Dialect-quoted preview
///
/// Failures use `{success: false, error}` rather than the plain error body.
async fn preview_handler(State(state): State<AppState>, body: Bytes) -> Response {
    match service::generate_preview(&state.settings, &body).await {
        Ok(preview) => Json::<PreviewResponse>(preview).into_response(),
        Err(e) => (
            e.status(),
            Json(json!({ "success": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// GET /api/health
async fn health_handler() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
