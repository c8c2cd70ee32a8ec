//! Error types for dishfeed.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    /// Resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Query string failed to decode or validate.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Malformed pagination cursor.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    // === Server Errors ===
    /// Database driver error.
    #[error("Database error: {0}")]
    Database(String),

    /// A reaction or statistics batch query failed; personalization state is unknown.
    #[error("Aggregation failure: {0}")]
    AggregationFailure(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_)
            | Self::Validation(_)
            | Self::InvalidQuery(_)
            | Self::InvalidCursor(_) => StatusCode::BAD_REQUEST,

            // 5xx Server Errors
            Self::Database(_)
            | Self::AggregationFailure(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::InvalidCursor(_) => "INVALID_CURSOR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::AggregationFailure(_) => "AGGREGATION_FAILURE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
