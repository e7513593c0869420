//! Mapping from domain errors to HTTP responses.
//!
//! Every error body has the shape `{"error": <code>, "message": <text>}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use utm_core::ZoneError;

use super::auth::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Zone(#[from] ZoneError),

    #[error(transparent)]
    Unauthenticated(#[from] AuthError),

    /// Body was not JSON or did not fit the expected shape.
    #[error("{0}")]
    InvalidBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Zone(ZoneError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Zone(err) if !err.is_client_error() => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Zone(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Zone(err) => err.code(),
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::InvalidBody(_) => "invalid_field",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Zone(err @ ZoneError::EvaluationFailed(source)) => {
                tracing::error!(error = %source, "Airspace evaluation failed");
                err.to_string()
            }
            ApiError::Zone(ZoneError::Store(source)) => {
                tracing::error!(error = %source, "Zone store operation failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "error": self.code(),
                "message": message,
            })),
        )
            .into_response()
    }
}
