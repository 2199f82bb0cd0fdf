//! Application error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use movement_client::MovementError;
use name_registry::RegistryError;
use serde::Serialize;
use thiserror::Error;
use twilio_client::TwilioError;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Movement(#[from] MovementError),

    #[error("Messaging error: {0}")]
    Twilio(#[from] TwilioError),

    #[error("Network {0} not found")]
    NetworkNotFound(String),

    #[error("Network config error: {0}")]
    NetworkConfig(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Too many requests, please try again later.")]
    RateLimitExceeded,

    #[error("Endpoint not found")]
    NotFound,
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::NetworkNotFound(_) => StatusCode::BAD_REQUEST,
            AppError::Registry(e) if e.is_conflict() => StatusCode::CONFLICT,
            AppError::Movement(MovementError::PhoneNotRegistered(_)) => StatusCode::BAD_REQUEST,
            AppError::Movement(MovementError::InvalidSecret(_)) => StatusCode::BAD_REQUEST,
            AppError::Movement(MovementError::FaucetUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Movement(_) | AppError::Twilio(_) => StatusCode::BAD_GATEWAY,
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Registry(_) | AppError::NetworkConfig(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::NetworkConfig(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::NetworkConfig(format!("JSON serialization error: {}", e))
    }
}
