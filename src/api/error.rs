//! HTTP error handling and response types.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::TravelPlannerError;

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub detail: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            detail: detail.into(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// A business rule rejected the request
    BadRequest(String),
    /// Malformed or invalid request payload
    Unprocessable(String),
    /// The artwork catalog failed
    BadGateway(String),
    /// A dependency of the service is down
    ServiceUnavailable(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    fn parts(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody::new("BAD_REQUEST", msg))
            }
            AppError::Unprocessable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody::new("VALIDATION_ERROR", msg),
            ),
            AppError::BadGateway(msg) => {
                (StatusCode::BAD_GATEWAY, ErrorBody::new("UPSTREAM_ERROR", msg))
            }
            AppError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody::new("SERVICE_UNAVAILABLE", msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("INTERNAL_ERROR", msg),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}

impl From<TravelPlannerError> for AppError {
    fn from(err: TravelPlannerError) -> Self {
        let detail = err.user_message();
        match err {
            TravelPlannerError::Validation { .. } => AppError::Unprocessable(detail),
            TravelPlannerError::NotFound { .. } => AppError::NotFound(detail),
            TravelPlannerError::Rule { .. } => AppError::BadRequest(detail),
            TravelPlannerError::Upstream { .. } => {
                warn!(error = %err, "Artwork catalog request failed");
                AppError::BadGateway(detail)
            }
            other => {
                error!(error = %other, "Request failed");
                AppError::Internal(detail)
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Unprocessable(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Unprocessable(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Unprocessable(rejection.body_text())
    }
}
