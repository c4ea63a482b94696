//! Store kinds and relational dialects

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Sqlite,
    Postgres,
    Document,
    KeyValue,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Sqlite => "sqlite",
            StoreKind::Postgres => "postgresql",
            StoreKind::Document => "mongodb",
            StoreKind::KeyValue => "redis",
        }
    }

    /// Returns true for the two SQL-speaking kinds
    pub fn is_relational(&self) -> bool {
        matches!(self, StoreKind::Sqlite | StoreKind::Postgres)
    }

    /// Syntax the generator is asked to produce for this kind
    pub fn target_syntax(&self) -> TargetSyntax {
        if self.is_relational() {
            TargetSyntax::Statement
        } else {
            TargetSyntax::Json
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical syntax a sanitized query must be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSyntax {
    /// One terminated SQL statement
    Statement,
    /// One balanced JSON value
    Json,
}

/// SQL dialect of a relational backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationalDialect {
    Sqlite,
    Postgres,
}

impl RelationalDialect {
    pub fn store_kind(&self) -> StoreKind {
        match self {
            RelationalDialect::Sqlite => StoreKind::Sqlite,
            RelationalDialect::Postgres => StoreKind::Postgres,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_syntax() {
        assert_eq!(StoreKind::Sqlite.target_syntax(), TargetSyntax::Statement);
        assert_eq!(StoreKind::Postgres.target_syntax(), TargetSyntax::Statement);
        assert_eq!(StoreKind::Document.target_syntax(), TargetSyntax::Json);
        assert_eq!(StoreKind::KeyValue.target_syntax(), TargetSyntax::Json);
    }

    #[test]
    fn test_dialect_kind() {
        assert_eq!(RelationalDialect::Postgres.store_kind(), StoreKind::Postgres);
        assert!(RelationalDialect::Sqlite.store_kind().is_relational());
    }
}
