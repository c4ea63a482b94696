//! Intent enrichment subsystem for polyquery
//!
//! Rule-based repair of generated queries using the original question:
//!
//! 1. Identifier correction: a wildcard becomes the exact requested key
//! 2. Join intent: two named entities force an order scan
//! 3. Typed predicates: comparisons, date bounds and years
//! 4. Categorical values from closed vocabularies
//! 5. Aggregation-field stripping
//!
//! Rules are deterministic and never override a filter already present.
//! When the generated text cannot be parsed at all, a default query is built
//! from the question with rules 1 to 4.

mod enricher;
mod fallback;
mod predicates;
mod question;
mod rules;
mod vocabulary;

pub use enricher::{Enriched, Enricher};
pub use predicates::extract;
pub use question::QuestionFacts;
pub use rules::{
    apply_document_predicates, apply_predicates, correct_identifier, force_join, is_known_field,
    retain_known_fields, strip_aggregates,
};
pub use vocabulary::Vocabulary;
