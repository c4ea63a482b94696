//! Query text sanitizer for polyquery
//!
//! Generator output is untrusted text. The sanitizer never fails: it strips
//! formatting artifacts and coerces the text toward the canonical syntax of
//! the target store, leaving semantic validation to the parser.

mod json;
mod sql;

pub use json::sanitize_json;
pub use sql::sanitize_statement;

use crate::store::TargetSyntax;

/// Sanitizes raw generator output for the given target syntax
pub fn sanitize(raw: &str, target: TargetSyntax) -> String {
    match target {
        TargetSyntax::Statement => sanitize_statement(raw),
        TargetSyntax::Json => sanitize_json(raw),
    }
}
