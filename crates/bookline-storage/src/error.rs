//! Storage error types for the Bookline storage abstraction layer.

use bookline_core::CoreError;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested record was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The kind of record that was not found.
        kind: &'static str,
        /// The ID of the record that was not found.
        id: String,
    },

    /// Attempted to create a record that conflicts with an existing one.
    #[error("{kind} already exists: {detail}")]
    AlreadyExists {
        /// The kind of record.
        kind: &'static str,
        /// What collided (alias, time window, ...).
        detail: String,
    },

    /// A domain guard evaluated under the store's write guard rejected
    /// the write (e.g. a disallowed status transition).
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// An internal storage error occurred.
    #[error("Internal storage error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(kind: &'static str, detail: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            detail: detail.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { kind, id } => CoreError::NotFound { kind, id },
            StorageError::Rejected(inner) => inner,
            other => CoreError::storage(other.to_string()),
        }
    }
}

/// Convenience result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
