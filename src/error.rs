//! Error types for the gateway
//!
//! Provides unified error handling using thiserror. Every variant maps to the
//! `{ success: false, error, details?, status? }` JSON envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == App Error Enum ==
/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum AppError {
    /// Local validation failure, no provider was contacted
    #[error("{0}")]
    InvalidRequest(String),

    /// Provider answered with a non-success status or an unusable body
    #[error("{message}")]
    Provider {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    /// Provider answered but gave neither report data nor a report id
    #[error("{0}")]
    ReportUnavailable(String),

    /// Endpoint switched off on purpose
    #[error("{0}")]
    Disabled(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure talking to a provider (connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// Anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Provider { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::ReportUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Disabled(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) | AppError::Http(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Builds the JSON body for this error.
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            AppError::Provider {
                status,
                message,
                details,
            } => ErrorResponse::new(message.clone())
                .with_details(details.clone())
                .with_status(*status),
            AppError::Config(_) | AppError::Http(_) | AppError::Internal(_) => {
                ErrorResponse::new("Internal server error")
                    .with_details(Some(Value::String(self.to_string())))
            }
            other => ErrorResponse::new(other.to_string()),
        }
    }
}

// Request URLs carry the provider key as a query parameter; never keep them.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Http(err.without_url())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(status = status.as_u16(), "request failed: {}", self);
        }

        (status, Json(self.to_error_response())).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the gateway.
pub type Result<T> = std::result::Result<T, AppError>;
