//! Platform Error Types
//!
//! The HTTP boundary is the only place where request outcomes and pipeline
//! faults become status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::error;

use crate::pipeline::{PipelineError, RequestResult, ValidationFailure};
use crate::shared::api_common::ApiError;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<ValidationFailure>,
    },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl PlatformError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Convert a non-success outcome. `Success` has no error form and is
    /// reported as an internal error if it ever reaches here.
    pub fn from_outcome<T>(outcome: RequestResult<T>) -> Self {
        match outcome {
            RequestResult::NotFound(message) => Self::NotFound { message },
            RequestResult::Unauthorized => Self::unauthorized("Authentication is required"),
            RequestResult::Forbidden => Self::forbidden("Access to this resource is forbidden"),
            RequestResult::Conflict(message) => Self::Conflict { message },
            RequestResult::Invalid(details) => Self::Validation {
                message: "Request validation failed".to_string(),
                details,
            },
            RequestResult::Error(message) => Self::Internal { message },
            RequestResult::Success(_) => Self::internal("unexpected success outcome"),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PlatformError::NotFound { .. } => StatusCode::NOT_FOUND,
            PlatformError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            PlatformError::Forbidden { .. } => StatusCode::FORBIDDEN,
            PlatformError::Conflict { .. } => StatusCode::CONFLICT,
            PlatformError::Validation { .. } | PlatformError::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            PlatformError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            PlatformError::Pipeline(err) if err.is_cancelled() => StatusCode::SERVICE_UNAVAILABLE,
            PlatformError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            PlatformError::NotFound { .. } => "NOT_FOUND",
            PlatformError::Unauthorized { .. } => "UNAUTHORIZED",
            PlatformError::Forbidden { .. } => "FORBIDDEN",
            PlatformError::Conflict { .. } => "CONFLICT",
            PlatformError::Validation { .. } => "VALIDATION_ERROR",
            PlatformError::BadRequest { .. } => "BAD_REQUEST",
            PlatformError::Internal { .. } => "INTERNAL_ERROR",
            PlatformError::Pipeline(err) if err.is_cancelled() => "CANCELLED",
            PlatformError::Pipeline(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Fault details stay in the logs, not in the response body.
        let message = match &self {
            PlatformError::Pipeline(err) if !err.is_cancelled() => {
                error!(error = %err, kind = err.kind(), "Request failed");
                "An unexpected error occurred".to_string()
            }
            PlatformError::Internal { message } => {
                error!(error = %message, "Request failed");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let details = match &self {
            PlatformError::Validation { details, .. } => serde_json::to_value(details).ok(),
            _ => None,
        };

        let body = ApiError {
            error: self.error_type().to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}
