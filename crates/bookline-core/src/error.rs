use thiserror::Error;

use crate::booking::BookingStatus;

/// Core error types for Bookline domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Invalid time range: end time {end} must be after start time {start}")]
    InvalidTimeRange { start: String, end: String },

    #[error("Invalid schedule: requested time must be in the future")]
    InvalidSchedule,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Identity is not verified")]
    NotVerified,

    #[error("Identity is not activatable")]
    NotActivatable,

    #[error("Invalid booking transition from '{current}' to '{requested}'")]
    InvalidTransition {
        current: BookingStatus,
        requested: BookingStatus,
    },

    #[error("Identity creation cooldown active: try again in {retry_after_hours} hours")]
    CooldownActive { retry_after_hours: i64 },

    #[error("Alias '{0}' is already taken")]
    DuplicateAlias(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("UUID error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Create a new field-level Validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new InvalidTimeRange error
    pub fn invalid_time_range(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self::InvalidTimeRange {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Create a new Forbidden error with a stable message key
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a new NotFound error
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a new Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Check if this error is a client error (4xx category)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }

    /// Check if this error is a server error (5xx category)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. }
            | Self::InvalidTimeRange { .. }
            | Self::InvalidSchedule
            | Self::JsonError(_)
            | Self::UuidError(_) => ErrorCategory::Validation,
            Self::Forbidden(_) | Self::NotVerified | Self::NotActivatable => {
                ErrorCategory::Authorization
            }
            Self::InvalidTransition { .. }
            | Self::CooldownActive { .. }
            | Self::DuplicateAlias(_) => ErrorCategory::StateConflict,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Storage(_) => ErrorCategory::Infrastructure,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Authorization,
    StateConflict,
    NotFound,
    Infrastructure,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Authorization => write!(f, "authorization"),
            Self::StateConflict => write!(f, "state_conflict"),
            Self::NotFound => write!(f, "not_found"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
