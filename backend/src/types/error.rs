//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use sensor_storage::SensorStorageError;
use serde::Serialize;

use crate::image_index::ResolveError;

/// API error body.
///
/// Most failures carry a `detail`; "nothing found" answers carry an `error` instead,
/// which the dashboard uses to tell an empty result from a failure.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum ApiErrorResponse {
    /// Failure with a human-readable explanation
    Detail {
        /// Human-readable error message
        detail: String,
    },
    /// Legitimately empty result
    Error {
        /// Human-readable error message
        error: String,
    },
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error with a `detail` body
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            inner: ApiErrorResponse::Detail {
                detail: detail.into(),
            },
        }
    }

    /// Create a 404 with an `error` body
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            inner: ApiErrorResponse::Error {
                error: message.into(),
            },
        }
    }

    /// HTTP status of this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    fn message(&self) -> &str {
        match &self.inner {
            ApiErrorResponse::Detail { detail } => detail,
            ApiErrorResponse::Error { error } => error,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", self.status, self.message()),
            500..=599 => tracing::error!("Server error: {} - {}", self.status, self.message()),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert image resolution errors to application errors
impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::MalformedQuery(reason) => Self::new(StatusCode::BAD_REQUEST, reason),
            ResolveError::ListingFailed(e) => {
                tracing::error!("Image listing failed: {e}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Could not list images from storage.",
                )
            }
        }
    }
}

/// Convert sensor storage errors to application errors
impl From<SensorStorageError> for AppError {
    fn from(err: SensorStorageError) -> Self {
        tracing::error!("Sensor storage error: {err}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to fetch sensor data.",
        )
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
