//! Notification Store Error Types
//!
//! Store operations themselves never fail; these errors cover misuse that has
//! to surface immediately, at construction time.

use thiserror::Error;

/// Result type for notification store construction
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors raised when a store cannot be built
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// The store was built outside a Tokio runtime, so its timers could never fire
    #[error("notification store must be created inside a Tokio runtime context")]
    NoRuntime,

    /// Store configuration failed validation
    #[error("invalid notification store configuration: {message}")]
    InvalidConfig { message: String },
}

impl NotificationError {
    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
