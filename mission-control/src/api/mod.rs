//! HTTP API routes for Mission Control

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub mod missions;

use crate::app_state::AppState;

#[derive(Clone)]
pub struct ApiState {
    pub app_state: Arc<AppState>,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/missions/orchestrate", post(missions::orchestrate_mission))
        .route("/rate-limits/{key}", get(missions::get_rate_limit_status))
}

/// Health check endpoint
pub async fn health_check(State(_state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "mission-control",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Machine-readable error codes returned in `{ error: { code, message } }`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    InvalidRequest,
    RateLimited,
    RateLimitNotFound,
    InternalError,
}

impl ApiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidRequest => "INVALID_REQUEST",
            ApiErrorCode::RateLimited => "RATE_LIMITED",
            ApiErrorCode::RateLimitNotFound => "RATE_LIMIT_NOT_FOUND",
            ApiErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiErrorCode::RateLimitNotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiError,
}

pub fn api_error(code: ApiErrorCode, message: impl Into<String>) -> (StatusCode, Json<ApiErrorBody>) {
    (
        code.status_code(),
        Json(ApiErrorBody {
            error: ApiError {
                code: code.as_str(),
                message: message.into(),
            },
        }),
    )
}

pub fn error_response(code: ApiErrorCode, message: impl Into<String>) -> Response {
    api_error(code, message).into_response()
}
