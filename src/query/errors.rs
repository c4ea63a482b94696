//! Query parsing errors

use thiserror::Error;

/// Sanitized text could not be read as the store's structured form.
///
/// Never surfaced to callers: enrichment recovers from it with a
/// conservative default query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Malformed query: {reason}")]
pub struct MalformedQueryError {
    pub reason: String,
}

impl MalformedQueryError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        "NLQ_MALFORMED_QUERY"
    }
}

pub type QueryResult<T> = Result<T, MalformedQueryError>;
