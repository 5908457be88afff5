//! JSON error envelope shared by every endpoint.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{ChannelError, ValidationError};

/// `{error: true, message, timestamp}`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: bool,
    pub message: String,
    pub timestamp: String,
}

/// An error that is safe to show to the HTTP caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.message)
    }
}

impl From<ChannelError> for ApiError {
    fn from(err: ChannelError) -> Self {
        match (&err, err.channel()) {
            (ChannelError::AuthFailed { .. }, Some("email")) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Service configuration error",
            ),
            (ChannelError::InvalidMessage(_), _) => Self::internal(),
            _ => Self::new(
                StatusCode::BAD_GATEWAY,
                "Messaging service temporarily unavailable",
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), message = %self.message, "Error response");
        } else {
            warn!(status = self.status.as_u16(), message = %self.message, "Error response");
        }

        let body = ErrorEnvelope {
            error: true,
            message: self.message,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        (self.status, Json(body)).into_response()
    }
}
