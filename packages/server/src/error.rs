use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use serde::Serialize;

use crate::plants::{PlantError, StoreError};

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `CONFLICT`, `UPSTREAM_GENERATION_ERROR`, `MALFORMED_SUGGESTION`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "name query is required")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    /// The content generator failed. Safe for the client to retry.
    UpstreamGeneration(String),
    MalformedSuggestion(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::UpstreamGeneration(detail) => {
                tracing::warn!("Upstream generation error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "UPSTREAM_GENERATION_ERROR",
                        message: "Image generation failed, please retry".into(),
                    },
                )
            }
            AppError::MalformedSuggestion(detail) => {
                tracing::warn!("Malformed suggestion: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "MALFORMED_SUGGESTION",
                        message: "Could not produce suggestions".into(),
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateName(name) => {
                AppError::Conflict(format!("A plant named '{name}' already exists"))
            }
            StoreError::NotFound(id) => AppError::NotFound(format!("Plant {id} not found")),
            backend @ StoreError::Backend { .. } => AppError::Internal(backend.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { actual, limit } => AppError::Validation(format!(
                "Image is {actual} bytes, the limit is {limit} bytes"
            )),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PlantError> for AppError {
    fn from(err: PlantError) -> Self {
        match err {
            PlantError::InvalidArgument(msg) => AppError::Validation(msg),
            PlantError::UpstreamGeneration(e) => AppError::UpstreamGeneration(e.to_string()),
            PlantError::MalformedSuggestion(msg) => AppError::MalformedSuggestion(msg),
            PlantError::Store(e) => e.into(),
            PlantError::Storage(e) => AppError::Internal(format!("image storage: {e}")),
            PlantError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
