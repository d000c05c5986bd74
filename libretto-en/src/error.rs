//! Error types for libretto-en

use crate::types::EnsembleError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// An upstream scoring source failed (502)
    #[error("Upstream source failure: {0}")]
    BadGateway(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// libretto-common error
    #[error("Common error: {0}")]
    Common(#[from] libretto_common::Error),
}

impl From<EnsembleError> for ApiError {
    fn from(err: EnsembleError) -> Self {
        match err {
            EnsembleError::Config(msg) => ApiError::BadRequest(msg),
            EnsembleError::Empty => {
                ApiError::NotFound("no usable candidates from any source".to_string())
            }
            err @ (EnsembleError::SourceTimeout { .. }
            | EnsembleError::SourceHttp { .. }
            | EnsembleError::SourceSchema { .. }
            | EnsembleError::Cancelled { .. }) => ApiError::BadGateway(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "SOURCE_FAILURE", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_maps_to_bad_request() {
        let api: ApiError = EnsembleError::Config("no sources".to_string()).into();
        assert!(matches!(api, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_empty_maps_to_not_found() {
        let api: ApiError = EnsembleError::Empty.into();
        assert!(matches!(api, ApiError::NotFound(_)));
    }

    #[test]
    fn test_source_errors_map_to_bad_gateway() {
        let timeout: ApiError = EnsembleError::SourceTimeout {
            source: "s1".to_string(),
            timeout_ms: 100,
        }
        .into();
        assert!(matches!(timeout, ApiError::BadGateway(_)));

        let schema: ApiError = EnsembleError::SourceSchema {
            source: "s1".to_string(),
            reason: "not json".to_string(),
        }
        .into();
        assert!(matches!(schema, ApiError::BadGateway(_)));
    }
}
