//! Pass.in — API error types.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use passin_core::decision::RejectionReason;
use passin_registration::application::command_handlers::TransientStoreFailure;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Tracing or exporter setup failed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// The request body failed validation.
    Invalid(String),
    /// The registration was evaluated and refused.
    Rejected(RejectionReason),
    /// The registration could not be decided right now.
    Unavailable(TransientStoreFailure),
}

impl From<TransientStoreFailure> for ApiError {
    fn from(err: TransientStoreFailure) -> Self {
        Self::Unavailable(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Self::Invalid(message) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message.clone(),
            ),
            Self::Rejected(reason) => {
                let status = match reason {
                    RejectionReason::UnknownEvent => StatusCode::NOT_FOUND,
                    RejectionReason::DuplicateRegistration | RejectionReason::CapacityExceeded => {
                        StatusCode::CONFLICT
                    }
                };
                (status, reason.code(), reason.message().to_owned())
            }
            Self::Unavailable(failure) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                failure.to_string(),
            ),
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };

        if status == StatusCode::SERVICE_UNAVAILABLE {
            return (status, [(header::RETRY_AFTER, "1")], Json(body)).into_response();
        }
        (status, Json(body)).into_response()
    }
}
