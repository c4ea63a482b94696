//! Store client errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by store clients
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// Session could not be opened
    #[error("Failed to connect: {0}")]
    Connect(String),

    /// Store refused or failed to run the statement
    #[error("Store rejected query: {0}")]
    Rejected(String),

    /// Store state could not be read
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Stable error code for presenters
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Connect(_) => "NLQ_STORE_CONNECT",
            StoreError::Rejected(_) => "NLQ_STORE_REJECTED",
            StoreError::Unavailable(_) => "NLQ_STORE_UNAVAILABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_code() {
        let err = StoreError::Rejected("no such table: users".into());
        assert_eq!(err.to_string(), "Store rejected query: no such table: users");
        assert_eq!(err.code(), "NLQ_STORE_REJECTED");
    }
}
