//! Stream error types
//!
//! Only construction-time problems and unexpected internal conditions are
//! reported here. Delivery failures are retried by the stream and show up
//! in logs and metrics, never as a `StreamError`.

use thiserror::Error;

/// Result type for stream operations
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors returned by [`DeliveryStream`](crate::DeliveryStream)
#[derive(Debug, Error)]
pub enum StreamError {
    /// Configuration value rejected at construction
    #[error("invalid stream config: {field} {message}")]
    InvalidConfig {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// The stream was constructed outside a Tokio runtime
    #[error("delivery stream requires a running tokio runtime")]
    NoRuntime,

    /// `close` was called on a stream that is already closing or closed
    #[error("delivery stream already closed")]
    AlreadyClosed,

    /// A background task panicked or was aborted
    #[error("background task failed: {0}")]
    Task(String),
}

impl StreamError {
    /// Create an InvalidConfig error
    pub fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }
}
