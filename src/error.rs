//! Service error types with HTTP status code mapping.
//!
//! [`AnalyticsError`] is the central error type for the service. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response. Missing reference data (an absent exchange rate, an empty
//! period) is deliberately *not* an error: KPI requests degrade to
//! zero-filled figures so the caller always gets a renderable snapshot.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1002,
///     "message": "unsupported spreadsheet format: csv",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                |
/// |-----------|-------------------|----------------------------|
/// | 1000–1999 | Request/Upload    | 400 Bad Request            |
/// | 3000–3999 | Server/Storage    | 500 Internal Server Error  |
/// | 4000–4999 | Extract-Specific  | 422 Unprocessable Entity   |
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The uploaded file is not one of the supported spreadsheet formats,
    /// or the workbook could not be parsed at all.
    #[error("unsupported spreadsheet format: {0}")]
    UnsupportedFormat(String),

    /// A required ingestion field is missing from the request.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The trimmed extract does not have the expected number of columns.
    ///
    /// Positional renaming against a drifted template would silently
    /// corrupt the store, so this aborts the whole request.
    #[error("column schema mismatch: expected {expected} columns, found {found}")]
    SchemaMismatch {
        /// Canonical column count the template must produce.
        expected: usize,
        /// Column count actually found after trimming.
        found: usize,
    },

    /// Bulk insert failed; the transaction was rolled back and nothing
    /// was persisted.
    #[error("ingestion failed, batch rolled back: {0}")]
    Ingestion(String),

    /// Persistence layer failure on a read path.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalyticsError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnsupportedFormat(_) => 1002,
            Self::Validation(_) => 1003,
            Self::SchemaMismatch { .. } => 4001,
            Self::Ingestion(_) => 3002,
            Self::Persistence(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::UnsupportedFormat(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::SchemaMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Ingestion(_) | Self::Persistence(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

impl From<sqlx::Error> for AnalyticsError {
    fn from(e: sqlx::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}
