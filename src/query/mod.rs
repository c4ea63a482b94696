//! Structured query subsystem for polyquery
//!
//! Sanitized generator output is parsed here into a typed query per store
//! kind. Parsing is lenient about surrounding noise but strict about shape:
//! a key-value query without a usable key, or a document query without a
//! collection or pipeline, is malformed.

mod ast;
mod errors;
mod parse;

pub use ast::{
    Comparator, Comparison, DocumentQuery, FieldCondition, FilterClause, FilterName, FilterSet,
    FilterValue, KeyValueQuery, RelationalQuery, StructuredQuery,
};
pub use errors::{MalformedQueryError, QueryResult};
pub use parse::{parse, parse_document, parse_key_value, parse_relational};
