//! API response envelope and error mapping for the Bookline HTTP layer.
//!
//! Every handler responds with the same shape: `{data, meta}`, where
//! `meta` carries `success`, an optional message, a timestamp, and any
//! error context fields (current vs. requested status on a rejected
//! transition, `retry_after_hours` on an active cooldown).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use time::OffsetDateTime;

use bookline_core::{CoreError, ErrorCategory};

// -------------------------
// Response envelope
// -------------------------

/// Metadata attached to every response. Extra error context fields are
/// flattened into the object alongside the fixed ones.
#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(flatten)]
    pub context: Map<String, Value>,
}

impl Meta {
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
            timestamp: OffsetDateTime::now_utc(),
            context: Map::new(),
        }
    }

    pub fn failure(message: impl Into<String>, context: Map<String, Value>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            timestamp: OffsetDateTime::now_utc(),
            context,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The `{data, meta}` wrapper every endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub meta: Meta,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            meta: Meta::success(),
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            meta: Meta::success().with_message(message),
        }
    }
}

impl Envelope<Value> {
    /// Error envelope: `data` is null, failure details live in `meta`.
    pub fn error(message: impl Into<String>, context: Map<String, Value>) -> Self {
        Self {
            data: None,
            meta: Meta::failure(message, context),
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// -------------------------
// API errors
// -------------------------

/// High-level API errors mapped to HTTP status codes and the error
/// envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unprocessable entity: {message}")]
    Unprocessable {
        message: String,
        context: Map<String, Value>,
    },
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::Unprocessable {
            message: msg.into(),
            context: Map::new(),
        }
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match &err {
            CoreError::InvalidTransition { current, requested } => {
                let mut context = Map::new();
                context.insert("current_status".into(), json!(current.as_str()));
                context.insert("requested_status".into(), json!(requested.as_str()));
                Self::Unprocessable { message, context }
            }
            CoreError::CooldownActive { retry_after_hours } => {
                let mut context = Map::new();
                context.insert("retry_after_hours".into(), json!(retry_after_hours));
                Self::Unprocessable { message, context }
            }
            CoreError::Validation { field, .. } => {
                let mut context = Map::new();
                context.insert("field".into(), json!(field));
                Self::Unprocessable { message, context }
            }
            _ => match err.category() {
                ErrorCategory::Validation | ErrorCategory::StateConflict => {
                    Self::Unprocessable {
                        message,
                        context: Map::new(),
                    }
                }
                ErrorCategory::Authorization => Self::Forbidden(message),
                ErrorCategory::NotFound => Self::NotFound(message),
                ErrorCategory::Infrastructure => Self::Internal(message),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let envelope = match self {
            ApiError::Unprocessable { message, context } => Envelope::error(message, context),
            other => Envelope::error(other.to_string(), Map::new()),
        };
        (status, Json(envelope)).into_response()
    }
}

/// Convenience result type for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
