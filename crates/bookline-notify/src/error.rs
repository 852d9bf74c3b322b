use thiserror::Error;

/// Errors raised by the notification transport layer.
///
/// Nothing in here ever propagates to the caller of a domain mutation;
/// dispatch failures are logged and retried or dropped.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Publish to channel '{channel}' failed: {message}")]
    PublishFailed { channel: String, message: String },
}

impl NotifyError {
    pub fn publish_failed(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PublishFailed {
            channel: channel.into(),
            message: message.into(),
        }
    }
}

/// Convenience result type for transport operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
