//! Response types for the Shift & Schedule Engine API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP status codes, plus the small JSON bodies the
//! endpoints return.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::calculation::ClockEvent;
use crate::error::EngineError;
use crate::models::{Shift, TimeEntry};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 response carrying `error`.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    /// A 401 response for a request without a usable identity.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: ApiError::new("UNAUTHENTICATED", message),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        let (status, error) = match error {
            EngineError::InvalidStateTransition { state, .. } => (
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "INVALID_STATE_TRANSITION",
                    message,
                    format!("The worker is currently {}", state),
                ),
            ),
            EngineError::NotFound { entity, .. } => (
                StatusCode::NOT_FOUND,
                ApiError::with_details(
                    "NOT_FOUND",
                    message,
                    format!("No {} with this id exists in your organization", entity),
                ),
            ),
            EngineError::MalformedTemplateEntry { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("MALFORMED_TEMPLATE_ENTRY", message),
            ),
            EngineError::PersistenceFailure { message: cause } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("PERSISTENCE_FAILURE", "Storage operation failed", cause),
            ),
            EngineError::ExportFailure { message: cause } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("EXPORT_FAILURE", "Report encoding failed", cause),
            ),
            EngineError::InvalidShift { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "INVALID_SHIFT",
                    message,
                    "The shift data contains invalid information",
                ),
            ),
            EngineError::InvalidSchedule { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "INVALID_SCHEDULE",
                    message,
                    "The schedule data contains invalid information",
                ),
            ),
            EngineError::InvalidDateRange { .. } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_DATE_RANGE", message),
            ),
            EngineError::AccessDenied { .. } => {
                (StatusCode::FORBIDDEN, ApiError::new("ACCESS_DENIED", message))
            }
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
            ),
        };
        ApiErrorResponse { status, error }
    }
}

/// Body returned by the clock endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ClockResponse {
    /// What happened.
    pub event: ClockEvent,
    /// The opened or completed shift.
    pub shift: Shift,
    /// The audit entry written for the transition.
    pub entry: TimeEntry,
    /// `"Xh Ym"` label of the completed shift's hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl ClockResponse {
    pub(crate) fn new(transition: crate::calculation::ClockTransition) -> Self {
        Self {
            duration: transition.shift.duration_label(),
            event: transition.event,
            shift: transition.shift,
            entry: transition.entry,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Crate version.
    pub version: String,
}
