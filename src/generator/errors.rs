//! Generator errors
//!
//! Generation failures end the request before any store access and are
//! never retried.

use std::time::Duration;

use thiserror::Error;

/// Result type for generator calls
pub type GenerationResult<T> = Result<T, GenerationError>;

/// The generator could not produce query text
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerationError {
    /// Transport failure or unreadable response
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    /// Generator answered with a non-success status
    #[error("Generator returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Generator answered with no usable text
    #[error("Generator returned empty output")]
    Empty,

    /// Generator did not answer within the configured bound
    #[error("Generator timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl GenerationError {
    pub fn code(&self) -> &'static str {
        "NLQ_GENERATION_FAILED"
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        GenerationError::Unavailable(reason.into())
    }
}
