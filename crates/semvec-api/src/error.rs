//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use semvec_core::SemvecError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    #[schema(example = "VALIDATION_ERROR")]
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type mapped onto HTTP statuses
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    #[error("Collection already exists: {0}")]
    CollectionExists(String),
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Vector store unavailable: {0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("VALIDATION_ERROR", msg),
            ),
            AppError::ModelUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("MODEL_UNAVAILABLE", "Embedding model is not available")
                    .with_details(msg),
            ),
            AppError::CollectionNotFound(name) => (
                StatusCode::NOT_FOUND,
                ApiError::new(
                    "COLLECTION_NOT_FOUND",
                    format!("Collection '{name}' not found"),
                ),
            ),
            AppError::CollectionExists(name) => (
                StatusCode::CONFLICT,
                ApiError::new(
                    "COLLECTION_EXISTS",
                    format!("Collection '{name}' already exists"),
                ),
            ),
            AppError::DimensionMismatch { expected, actual } => (
                StatusCode::BAD_REQUEST,
                ApiError::new(
                    "DIMENSION_MISMATCH",
                    format!("Expected {expected} dimensions, got {actual}"),
                ),
            ),
            AppError::Upstream(msg) => (
                StatusCode::BAD_GATEWAY,
                ApiError::new("UPSTREAM_UNAVAILABLE", "Vector store is unreachable")
                    .with_details(msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", "Internal server error").with_details(msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<SemvecError> for AppError {
    fn from(err: SemvecError) -> Self {
        match err {
            SemvecError::Validation(msg) => AppError::Validation(msg),
            SemvecError::ModelUnavailable(msg) => AppError::ModelUnavailable(msg),
            SemvecError::CollectionNotFound(name) => AppError::CollectionNotFound(name),
            SemvecError::CollectionAlreadyExists(name) => AppError::CollectionExists(name),
            SemvecError::DimensionMismatch { expected, actual } => {
                AppError::DimensionMismatch { expected, actual }
            }
            SemvecError::Upstream(msg) => AppError::Upstream(msg),
            SemvecError::Config(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            SemvecError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
