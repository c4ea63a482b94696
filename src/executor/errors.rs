//! Executor error types
//!
//! Error codes:
//! - NLQ_EXECUTION_FAILED: the store rejected the submitted query
//! - NLQ_PREDICATE_REJECTED: a filter could not be evaluated (request yields
//!   an empty table, not an error)

use std::fmt;

use thiserror::Error;

use crate::schema::FieldKind;
use crate::store::StoreError;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutionError>;

/// The store refused or failed to run a query
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Execution failed for `{query}`: {source}")]
pub struct ExecutionError {
    /// Exact query text submitted to the store
    pub query: String,
    pub source: StoreError,
}

impl ExecutionError {
    pub fn new(query: impl Into<String>, source: StoreError) -> Self {
        Self {
            query: query.into(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        "NLQ_EXECUTION_FAILED"
    }
}

/// A filter whose operand or stored value could not be coerced
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Predicate on `{field}` rejected: {reason}")]
pub struct PredicateError {
    /// Row field the predicate was evaluated against
    pub field: String,
    pub reason: String,
}

impl PredicateError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        "NLQ_PREDICATE_REJECTED"
    }
}

/// A stored value that did not decode as its declared kind and was kept as
/// raw text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeWarning {
    pub key: String,
    pub field: String,
    pub raw: String,
    pub expected: FieldKind,
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} = {:?} is not {}; kept as text",
            self.key,
            self.field,
            self.raw,
            self.expected.type_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_carries_query() {
        let err = ExecutionError::new(
            "SELECT * FROM nope;",
            StoreError::Rejected("no such table: nope".into()),
        );
        assert_eq!(err.code(), "NLQ_EXECUTION_FAILED");
        assert_eq!(
            err.to_string(),
            "Execution failed for `SELECT * FROM nope;`: Store rejected query: no such table: nope"
        );
    }

    #[test]
    fn test_decode_warning_display() {
        let warning = DecodeWarning {
            key: "order:1".into(),
            field: "quantity".into(),
            raw: "two".into(),
            expected: FieldKind::Int,
        };
        assert_eq!(warning.to_string(), "order:1.quantity = \"two\" is not int; kept as text");
    }
}
