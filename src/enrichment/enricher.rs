//! Parse-and-enrich entry point

use tracing::{debug, warn};

use super::fallback;
use super::predicates;
use super::question::QuestionFacts;
use super::rules;
use super::vocabulary::Vocabulary;
use crate::observability::Event;
use crate::query::{self, DocumentQuery, KeyValueQuery, MalformedQueryError, StructuredQuery};
use crate::schema::Schema;
use crate::store::StoreKind;

/// Outcome of parsing and enriching one sanitized query
#[derive(Debug, Clone, PartialEq)]
pub struct Enriched {
    pub query: StructuredQuery,
    /// True if the sanitized text was malformed and a default was built
    pub recovered: bool,
}

/// Applies the enrichment rules with a fixed vocabulary
#[derive(Debug, Clone, Default)]
pub struct Enricher {
    vocabulary: Vocabulary,
}

impl Enricher {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Parses sanitized text and enriches it; malformed text is replaced by
    /// a default query built from the question alone
    pub fn resolve(&self, kind: StoreKind, clean: &str, question: &str, schema: &Schema) -> Enriched {
        match query::parse(kind, clean) {
            Ok(parsed) => Enriched {
                query: self.enrich(parsed, question, schema),
                recovered: false,
            },
            Err(error) => Enriched {
                query: self.recover(kind, question, &error),
                recovered: true,
            },
        }
    }

    /// Enriches a parsed query. Relational queries pass through.
    pub fn enrich(&self, query: StructuredQuery, question: &str, schema: &Schema) -> StructuredQuery {
        match query {
            StructuredQuery::KeyValue(q) => {
                StructuredQuery::KeyValue(self.enrich_key_value(q, question, schema))
            }
            StructuredQuery::Document(q) => StructuredQuery::Document(self.enrich_document(q, question)),
            relational @ StructuredQuery::Relational(_) => relational,
        }
    }

    /// Applies the key-value rules. Field conditions naming neither a record
    /// field nor an introspected one are dropped.
    pub fn enrich_key_value(&self, query: KeyValueQuery, question: &str, schema: &Schema) -> KeyValueQuery {
        let facts = QuestionFacts::analyze(question);
        let before = query.key_pattern.clone();

        let query = rules::correct_identifier(query, &facts);
        let query = rules::force_join(query, &facts);
        let query = rules::apply_predicates(query, &predicates::extract(&facts, &self.vocabulary));
        let query = rules::strip_aggregates(query);
        let (query, dropped) = rules::retain_known_fields(query, schema);
        for condition in &dropped {
            warn!(
                event = %Event::FieldConditionDropped,
                field = %condition.field,
                "condition names no known field; ignored"
            );
        }

        debug!(
            event = %Event::QueryEnriched,
            from = %before,
            key = %query.key_pattern,
            require_joined = query.require_joined,
            "key-value query enriched"
        );
        query
    }

    pub fn enrich_document(&self, query: DocumentQuery, question: &str) -> DocumentQuery {
        let facts = QuestionFacts::analyze(question);
        let query = rules::apply_document_predicates(query, &predicates::extract(&facts, &self.vocabulary));
        debug!(event = %Event::QueryEnriched, "document query enriched");
        query
    }

    /// Builds the default query for malformed generator output
    pub fn recover(
        &self,
        kind: StoreKind,
        question: &str,
        error: &MalformedQueryError,
    ) -> StructuredQuery {
        let facts = QuestionFacts::analyze(question);
        let query = match kind {
            StoreKind::KeyValue => StructuredQuery::KeyValue(fallback::key_value(&facts, &self.vocabulary)),
            StoreKind::Document => StructuredQuery::Document(fallback::document(&facts, &self.vocabulary)),
            StoreKind::Sqlite | StoreKind::Postgres => {
                StructuredQuery::Relational(fallback::relational(&facts))
            }
        };

        warn!(
            event = %Event::MalformedQueryRecovered,
            store = %kind,
            code = error.code(),
            reason = %error.reason,
            replacement = %query.text(),
            "generated query was malformed; using default"
        );
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Comparison;

    fn key_value(enriched: Enriched) -> KeyValueQuery {
        match enriched.query {
            StructuredQuery::KeyValue(q) => q,
            other => panic!("expected key-value query, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_enriches_parsed_query() {
        let enricher = Enricher::default();
        let enriched = enricher.resolve(
            StoreKind::KeyValue,
            r#"{"key": "product:*"}"#,
            "products with price greater than 500",
            &Schema::new(),
        );
        assert!(!enriched.recovered);
        let query = key_value(enriched);
        assert_eq!(query.filters.price, Some(Comparison::gt(500.0)));
    }

    #[test]
    fn test_resolve_recovers_malformed_text() {
        let enricher = Enricher::default();
        let enriched = enricher.resolve(
            StoreKind::KeyValue,
            "I cannot answer that",
            "show customer with ID 7",
            &Schema::new(),
        );
        assert!(enriched.recovered);
        assert_eq!(key_value(enriched).key_pattern, "customer:7");
    }

    #[test]
    fn test_generator_noise_keys_are_ignored() {
        let enricher = Enricher::default();
        let enriched = enricher.resolve(
            StoreKind::KeyValue,
            r#"{"key": "order:*", "operation": "HGETALL", "count": true, "status": "Shipped"}"#,
            "list orders",
            &Schema::new(),
        );
        let query = key_value(enriched);
        let fields: Vec<&str> = query.field_conditions.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["status"]);
    }

    #[test]
    fn test_introspected_fields_are_kept() {
        let enricher = Enricher::default();
        let schema = Schema::new().with_field("order", "coupon", "str");
        let enriched = enricher.resolve(
            StoreKind::KeyValue,
            r#"{"key": "order:*", "coupon": "SPRING"}"#,
            "orders with a coupon",
            &schema,
        );
        assert_eq!(key_value(enriched).field_conditions.len(), 1);
    }

    #[test]
    fn test_relational_is_not_enriched() {
        let enricher = Enricher::default();
        let enriched = enricher.resolve(
            StoreKind::Sqlite,
            "SELECT * FROM products;",
            "products with price greater than 500",
            &Schema::new(),
        );
        assert_eq!(enriched.query.text(), "SELECT * FROM products;");
        assert!(!enriched.recovered);
    }

    #[test]
    fn test_document_recovery() {
        let enricher = Enricher::default();
        let enriched = enricher.resolve(StoreKind::Document, "{}", "list products", &Schema::new());
        assert!(enriched.recovered);
        assert_eq!(
            enriched.query,
            StructuredQuery::Document(DocumentQuery::find_all("products"))
        );
    }
}
