//! Serve command - HTTP API over the scanner and extractor.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use bpscan_core::error::{BpscanError, ImageError, VisionError};
use bpscan_core::models::config::{BpscanConfig, ProviderKind};
use bpscan_core::payload::ImagePayload;
use bpscan_core::reading::{ExtractionResult, ReadingExtractor};
use bpscan_core::scan::{ScanReport, Scanner};

use super::config;
use super::scan::build_scanner;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides configuration)
    #[arg(short, long)]
    port: Option<u16>,
}

/// Shared handler state.
#[derive(Clone)]
struct AppState {
    /// `None` when the provider's API key is not configured.
    scanner: Option<Arc<Scanner>>,
    provider: ProviderKind,
    extractor: ReadingExtractor,
    max_image_kb: usize,
}

impl AppState {
    fn from_config(config: &BpscanConfig) -> Self {
        let scanner = match build_scanner(config) {
            Ok(scanner) => Some(Arc::new(scanner)),
            Err(e) => {
                warn!("Vision endpoints disabled: {}", e);
                None
            }
        };

        Self {
            scanner,
            provider: config.vision.provider,
            extractor: ReadingExtractor::from_config(&config.extraction),
            max_image_kb: config.vision.max_image_kb,
        }
    }

    fn scanner(&self) -> Result<&Scanner, ApiError> {
        self.scanner.as_deref().ok_or_else(|| {
            error!("No {} API key found", self.provider.name());
            ApiError::internal(
                format!("{} API key not configured", self.provider.name()),
                Some(format!(
                    "Set {} in the server environment and restart",
                    self.provider.api_key_env()
                )),
            )
        })
    }
}

#[derive(Debug, Deserialize)]
struct ImageRequest {
    #[serde(default)]
    image: String,
}

#[derive(Debug, Deserialize)]
struct TextRequest {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct VisionResponse {
    text: String,
    success: bool,
}

/// JSON error body: `{ "error", "details" }`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl ApiError {
    fn internal(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: error.into(),
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ImageError> for ApiError {
    fn from(e: ImageError) -> Self {
        let (error, details) = match &e {
            ImageError::Missing => (
                "No image provided",
                "Request body must contain base64 image data".to_string(),
            ),
            ImageError::InvalidBase64 | ImageError::UnsupportedFormat(_) => {
                ("Invalid image format", e.to_string())
            }
            ImageError::TooLarge { .. } => ("Image too large", e.to_string()),
        };
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.to_string(),
            details: Some(details),
        }
    }
}

impl From<VisionError> for ApiError {
    fn from(e: VisionError) -> Self {
        error!("Vision API error: {}", e);
        let details = match &e {
            VisionError::InvalidApiKey(_) => Some("Status: 401".to_string()),
            VisionError::RateLimited => Some("Status: 429".to_string()),
            VisionError::Upstream { status, .. } => Some(format!("Status: {}", status)),
            VisionError::Http(inner) => Some(inner.to_string()),
            VisionError::MissingApiKey(_) | VisionError::EmptyResponse => None,
        };
        let error = match &e {
            VisionError::Upstream { .. } => "Vision API request failed".to_string(),
            VisionError::Http(_) => "Internal server error".to_string(),
            other => capitalize(&other.to_string()),
        };
        Self::internal(error, details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "Invalid request body".to_string(),
            details: Some(rejection.body_text()),
        }
    }
}

impl From<BpscanError> for ApiError {
    fn from(e: BpscanError) -> Self {
        match e {
            BpscanError::Vision(e) => e.into(),
            BpscanError::Image(e) => e.into(),
            other => Self::internal("Internal server error", Some(other.to_string())),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = config::load(config_path)?;

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    let app = router(AppState::from_config(&config));

    info!("Listening on http://{}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

/// Request body limit for a base64 image of at most `max_image_kb` decoded KB.
///
/// Base64 inflates by 4/3; the extra 64 KB covers the JSON envelope.
fn body_limit(max_image_kb: usize) -> usize {
    max_image_kb
        .saturating_mul(1024 * 4 / 3 + 1)
        .saturating_add(64 * 1024)
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/vision", api_route(post(vision)))
        .route("/api/extract", api_route(post(extract)))
        .route("/api/reading", api_route(post(reading)))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit(state.max_image_kb)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Plain OPTIONS answers 200; any other method answers 405.
fn api_route(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route
        .options(|| async { StatusCode::OK })
        .fallback(method_not_allowed)
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

/// Raw provider transcription, as the presentation layer expects it.
async fn vision(
    State(state): State<AppState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<VisionResponse>, ApiError> {
    let Json(request) = payload?;
    let scanner = state.scanner()?;
    let image = ImagePayload::from_base64(&request.image, state.max_image_kb)?;
    info!("Received image: {} KB, {}", image.size_kb(), image.mime_type());

    let transcription = scanner.client().transcribe(&image).await?;
    let text = transcription.text().unwrap_or("No text found.").to_string();

    Ok(Json(VisionResponse {
        text,
        success: true,
    }))
}

/// Full round trip: transcription plus extracted reading.
async fn extract(
    State(state): State<AppState>,
    payload: Result<Json<ImageRequest>, JsonRejection>,
) -> Result<Json<ScanReport>, ApiError> {
    let Json(request) = payload?;
    let scanner = state.scanner()?;
    let image = ImagePayload::from_base64(&request.image, state.max_image_kb)?;

    Ok(Json(scanner.scan(&image).await?))
}

/// Offline extraction from already-recognized text.
async fn reading(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.extractor.extract_detailed(&request.text)))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "provider": state.provider,
        "vision": state.scanner.is_some(),
    }))
}
