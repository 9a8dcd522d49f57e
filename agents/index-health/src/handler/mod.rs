//! HTTP handler for the Index Health Exporter
//!
//! - GET /metrics - poll the cluster and return the Prometheus exposition
//! - GET /health - exporter liveness, does not touch the cluster

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::collector::IndexHealthCollector;
use crate::error::ExporterError;

/// Application state
pub struct AppState {
    pub collector: IndexHealthCollector,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(collector: IndexHealthCollector) -> Self {
        Self {
            collector,
            started_at: Instant::now(),
        }
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Metrics endpoint; every request runs one poll
async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let body = state.collector.render().await?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error information for API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    InternalError(String),
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ExporterError> for ApiError {
    fn from(err: ExporterError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::InternalError(msg) => msg.clone(),
        };
        tracing::error!(code = self.error_code(), "{}", message);
        (
            status,
            Json(ErrorInfo {
                code: self.error_code().to_string(),
                message,
            }),
        )
            .into_response()
    }
}
