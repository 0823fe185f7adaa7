//! Error handling for the server
//!
//! [`ApiError`] is returned by handlers and rendered as
//! `{"error": <kind>, "message": <text>}`. [`ServerError`] covers startup.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use demand_forecast::ForecastError;
use serde::Serialize;

/// Handler error with HTTP response mapping
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed multipart request or missing upload field (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Pipeline failure; client errors map to 422, the rest to 500
    #[error(transparent)]
    Forecast(#[from] ForecastError),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Startup failure
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid allowed origin '{0}'")]
    InvalidOrigin(String),

    #[error("failed to load artifacts: {0}")]
    Artifacts(#[from] ForecastError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    /// Status code and error kind
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Forecast(err) => match err.client_kind() {
                Some(kind) => (StatusCode::UNPROCESSABLE_ENTITY, kind),
                None => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.classify();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "rejected request");
        }

        let body = ErrorBody {
            error,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
