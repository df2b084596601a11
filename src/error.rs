//! Common error types for the edit gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::edit::validator::ValidationError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    UpstreamConfig(String),

    #[error("{message}")]
    UpstreamRequestFailed { status: u16, message: String },

    #[error("Generation service request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("No image was returned by the generation service.")]
    NoImageReturned,

    #[error("Generation service returned a malformed image: {0}")]
    MalformedImagePayload(String),

    #[error("Failed to composite the edited image: {0}")]
    CompositingFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status surfaced for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(e) => e.status_code(),
            AppError::UpstreamConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UpstreamRequestFailed { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::NoImageReturned => StatusCode::BAD_GATEWAY,
            AppError::MalformedImagePayload(_) => StatusCode::BAD_GATEWAY,
            AppError::CompositingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response envelope
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Edit request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
