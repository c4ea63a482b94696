//! Observability events for polyquery
//!
//! Every log line emitted by the pipeline carries one of these names in its
//! `event` field, so downstream tooling can filter on a closed vocabulary.

use std::fmt;

/// Observable events in a query request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Request lifecycle
    /// Question received
    QueryReceived,
    /// Store schema introspected
    SchemaIntrospected,
    /// Generator returned raw query text
    QueryGenerated,
    /// Generator failed or timed out
    GenerationFailed,
    /// Raw text sanitized
    QuerySanitized,
    /// Structured query enriched from the question
    QueryEnriched,
    /// Field condition naming no known field removed
    FieldConditionDropped,
    /// Generator output unusable, default query substituted
    MalformedQueryRecovered,
    /// Query executed successfully
    QueryExecuted,
    /// Store rejected the query
    QueryRejected,

    // Key-value emulation
    /// Key skipped because it is not a hash record
    RecordSkipped,
    /// Field kept as raw text after a decode failure
    FieldDecodeFallback,
    /// Predicate input could not be coerced, result emptied
    PredicateRejected,
    /// Shape transform applied to the merged rows
    ShapeApplied,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::QueryReceived => "QUERY_BEGIN",
            Event::SchemaIntrospected => "SCHEMA_INTROSPECTED",
            Event::QueryGenerated => "QUERY_GENERATED",
            Event::GenerationFailed => "GENERATION_FAILED",
            Event::QuerySanitized => "QUERY_SANITIZED",
            Event::QueryEnriched => "QUERY_ENRICHED",
            Event::FieldConditionDropped => "FIELD_CONDITION_DROPPED",
            Event::MalformedQueryRecovered => "MALFORMED_QUERY_RECOVERED",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",

            Event::RecordSkipped => "RECORD_SKIPPED",
            Event::FieldDecodeFallback => "FIELD_DECODE_FALLBACK",
            Event::PredicateRejected => "PREDICATE_REJECTED",
            Event::ShapeApplied => "SHAPE_APPLIED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
