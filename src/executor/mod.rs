//! Query executor subsystem for polyquery
//!
//! One executor per store family, each returning a uniform `ResultTable`:
//!
//! - relational: run the statement, return all rows
//! - document: `aggregate` for pipelines, `find` for filter queries
//! - key-value: relational emulation over hash records (reference
//!   resolution, AND-composed filters, grouping and projection)
//!
//! Store failures surface as `ExecutionError` carrying the submitted query.
//! Decode fallbacks and filter rejections are reported in `ExecutionStats`
//! instead of failing the request.

mod decode;
mod document;
mod errors;
mod filters;
mod key_value;
mod relational;
mod result;
mod shape;

pub use decode::decode_fields;
pub use document::execute_document;
pub use errors::{DecodeWarning, ExecutionError, ExecutorResult, PredicateError};
pub use filters::{target_fields, PredicateFilter};
pub use key_value::{execute_key_value, KeyValueExecutor};
pub use relational::execute_relational;
pub use result::{Execution, ExecutionStats, Record, ResultTable, Scalar};
pub use shape::Shape;
