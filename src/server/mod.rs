//! HTTP surface — axum router over the roster reader, renderer and orchestrator.

pub mod upload;
pub mod ws;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::batch::{BatchOrchestrator, BatchReport, ProgressHub};
use crate::config::AppConfig;
use crate::delivery;
use crate::error::{ConfigError, Error, ValidationError};
use crate::render;
use crate::roster::RecordInput;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Room for multipart framing on top of the file itself.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub progress: Arc<ProgressHub>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            progress: ProgressHub::new(),
        }
    }
}

/// Build the Axum router with every API route and the progress socket.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/health", get(health))
        .route("/api/upload-excel", post(upload::upload_excel))
        .route("/api/upload-template", post(upload::upload_template))
        .route("/api/send-bulk-emails", post(send_bulk_emails))
        .route("/api/process-bulk-email", post(send_bulk_emails))
        .route("/api/email/verify", get(verify_email))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + BODY_LIMIT_SLACK))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Errors ──────────────────────────────────────────────────────────────

/// Request-level failure rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::Validation(v) => Self::bad_request(v.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Error::from(e).into()
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        Error::from(e).into()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        Error::from(e).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "Request failed");
        } else {
            warn!(status = %self.status, error = %self.message, "Request rejected");
        }
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "Server is running!" }))
}

// ── Bulk send ───────────────────────────────────────────────────────────

/// Extract the `data` array of a batch request.
pub fn parse_batch_request(body: &Value) -> Result<Vec<RecordInput>, ValidationError> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(RecordInput::from_json).collect())
        .ok_or(ValidationError::InvalidFormat)
}

async fn send_bulk_emails(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BatchReport>, ApiError> {
    let Json(body) = body.map_err(|_| ValidationError::InvalidFormat)?;
    let records = parse_batch_request(&body)?;

    // Credentials are checked before any record is touched.
    let delivery = delivery::connect(&state.config.transport)?;
    let renderer = render::build_renderer(&state.config.card, &state.config.paths);
    info!(
        records = records.len(),
        transport = delivery.name(),
        renderer = renderer.name(),
        "Bulk email request accepted"
    );

    let orchestrator =
        BatchOrchestrator::new(renderer, delivery).with_progress(Arc::clone(&state.progress));
    Ok(Json(orchestrator.run(&records).await))
}

// ── Transport check ─────────────────────────────────────────────────────

async fn verify_email(State(state): State<AppState>) -> impl IntoResponse {
    let transport = state.config.transport.name();
    let body = match delivery::connect(&state.config.transport) {
        Err(e) => json!({
            "transport": transport,
            "configured": false,
            "verified": false,
            "error": e.to_string(),
        }),
        Ok(client) => match client.verify().await {
            Ok(()) => json!({
                "transport": transport,
                "configured": true,
                "verified": true,
            }),
            Err(e) => json!({
                "transport": transport,
                "configured": true,
                "verified": false,
                "error": e.to_string(),
            }),
        },
    };
    Json(body)
}
