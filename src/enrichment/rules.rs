//! Enrichment rules
//!
//! Each rule is a pure function from query to query. Rules never override a
//! filter that is already present.

use serde_json::{Map, Value};

use super::question::QuestionFacts;
use crate::query::{DocumentQuery, FieldCondition, FilterClause, FilterName, KeyValueQuery};
use crate::schema::{Entity, Schema};
use crate::store::has_wildcard;

/// Field-name prefixes designating a computed result rather than a filter
const AGGREGATE_PREFIXES: &[&str] = &[
    "sum_", "avg_", "average_", "count_", "max_", "min_", "total_spending", "total_sales",
];

/// Field names that request aggregation outright
const AGGREGATE_NAMES: &[&str] = &["aggregate", "aggregation", "group_by", "groupby"];

/// Entities whose fields are merged into joined rows
const MERGED: [Entity; 2] = [Entity::Customer, Entity::Product];

/// Replaces a wildcard pattern with the exact key of the requested record.
///
/// The entity is the first one named in the question, else the pattern's
/// own prefix, else `order`.
pub fn correct_identifier(mut query: KeyValueQuery, facts: &QuestionFacts) -> KeyValueQuery {
    let Some(id) = facts.identifier() else {
        return query;
    };
    if has_wildcard(&query.key_pattern) {
        let entity = facts
            .primary_entity()
            .or_else(|| pattern_entity(&query.key_pattern))
            .unwrap_or(Entity::Order);
        query.key_pattern = entity.key(id);
    }
    query
}

/// Entity named by a pattern's literal prefix (`order` in `order:*`)
fn pattern_entity(pattern: &str) -> Option<Entity> {
    let (prefix, _) = pattern.split_once(':')?;
    Entity::from_prefix(prefix)
}

/// Rewrites the pattern to scan orders when two entities are named.
///
/// An extracted identifier takes precedence: the exact key is kept, and only
/// the join requirement is recorded when that key is an order.
pub fn force_join(mut query: KeyValueQuery, facts: &QuestionFacts) -> KeyValueQuery {
    if !facts.has_join_intent() {
        return query;
    }
    if facts.identifier().is_none() {
        query.key_pattern = Entity::Order.wildcard();
        query.require_joined = true;
    } else if query.key_pattern.starts_with("order:") {
        query.require_joined = true;
    }
    query
}

/// Fills empty slots with extracted clauses
pub fn apply_predicates(
    mut query: KeyValueQuery,
    extracted: &[(FilterName, FilterClause)],
) -> KeyValueQuery {
    for (name, clause) in extracted {
        query.filters.set_if_absent(*name, clause.clone());
    }
    query
}

fn is_aggregate_field(field: &str) -> bool {
    let field = field.to_ascii_lowercase();
    AGGREGATE_NAMES.contains(&field.as_str())
        || AGGREGATE_PREFIXES.iter().any(|p| field.starts_with(p))
}

/// Drops field conditions that name a computed result
pub fn strip_aggregates(mut query: KeyValueQuery) -> KeyValueQuery {
    query
        .field_conditions
        .retain(|condition| !is_aggregate_field(&condition.field));
    query
}

fn is_merged_field(field: &str, schema: &Schema) -> bool {
    MERGED.into_iter().any(|entity| {
        let Some(inner) = field
            .strip_prefix(entity.prefix())
            .and_then(|rest| rest.strip_prefix('_'))
        else {
            return false;
        };
        entity.fields().contains(&inner)
            || schema
                .entity(entity.prefix())
                .is_some_and(|e| e.field(inner).is_some())
    })
}

/// Returns true if `field` can appear on a fetched or merged row
pub fn is_known_field(field: &str, schema: &Schema) -> bool {
    field == "key"
        || Entity::ALL.iter().any(|e| e.fields().contains(&field))
        || schema.entities().iter().any(|e| e.field(field).is_some())
        || is_merged_field(field, schema)
}

/// Removes field conditions naming no known field; returns the removed ones
pub fn retain_known_fields(
    mut query: KeyValueQuery,
    schema: &Schema,
) -> (KeyValueQuery, Vec<FieldCondition>) {
    let (known, unknown): (Vec<_>, Vec<_>) = std::mem::take(&mut query.field_conditions)
        .into_iter()
        .partition(|condition| is_known_field(&condition.field, schema));
    query.field_conditions = known;
    (query, unknown)
}

/// Adds extracted clauses to a document filter query.
///
/// A clause is written only when its attribute belongs to the queried
/// collection's entity and the field is not filtered yet. Pipelines are
/// returned untouched.
pub fn apply_document_predicates(
    query: DocumentQuery,
    extracted: &[(FilterName, FilterClause)],
) -> DocumentQuery {
    let (collection, mut filter) = match query {
        DocumentQuery::Find { collection, filter } => (collection, filter),
        pipeline => return pipeline,
    };
    let Some(entity) = Entity::from_collection(&collection) else {
        return DocumentQuery::Find { collection, filter };
    };

    for (name, clause) in extracted {
        let Some((owner, field)) = name.document_field() else {
            continue;
        };
        if owner != entity || filter.contains_key(field) {
            continue;
        }
        filter.insert(field.to_string(), document_clause(clause));
    }
    DocumentQuery::Find { collection, filter }
}

fn document_clause(clause: &FilterClause) -> Value {
    match clause {
        FilterClause::Match(term) => Value::String(term.clone()),
        FilterClause::Compare(comparison) => {
            let mut op = Map::new();
            op.insert(
                comparison.comparator.operator().to_string(),
                comparison.value.to_json(),
            );
            Value::Object(op)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Comparator, Comparison, FieldCondition, FilterValue};
    use serde_json::json;

    #[test]
    fn test_identifier_replaces_wildcard() {
        let facts = QuestionFacts::analyze("show customer with ID 7");
        let query = correct_identifier(KeyValueQuery::new("customer:*"), &facts);
        assert_eq!(query.key_pattern, "customer:7");
    }

    #[test]
    fn test_identifier_leaves_exact_key() {
        let facts = QuestionFacts::analyze("show customer with ID 7");
        let query = correct_identifier(KeyValueQuery::new("customer:3"), &facts);
        assert_eq!(query.key_pattern, "customer:3");
    }

    #[test]
    fn test_identifier_uses_entity_priority() {
        let facts = QuestionFacts::analyze("product bought in order id 4 by a customer");
        let query = correct_identifier(KeyValueQuery::new("*"), &facts);
        assert_eq!(query.key_pattern, "customer:4");
    }

    #[test]
    fn test_identifier_without_entity_uses_pattern_prefix() {
        let facts = QuestionFacts::analyze("show the record with ID 7");
        let query = correct_identifier(KeyValueQuery::new("order:*"), &facts);
        assert_eq!(query.key_pattern, "order:7");

        let query = correct_identifier(KeyValueQuery::new("product:?"), &facts);
        assert_eq!(query.key_pattern, "product:7");

        let query = correct_identifier(KeyValueQuery::new("*"), &facts);
        assert_eq!(query.key_pattern, "order:7");
        let query = correct_identifier(KeyValueQuery::new("inv*:*"), &facts);
        assert_eq!(query.key_pattern, "order:7");
    }

    #[test]
    fn test_unknown_fields_are_dropped() {
        let schema = Schema::new().with_field("order", "gift_note", "str");
        let mut query = KeyValueQuery::new("order:*");
        for field in ["operation", "status", "customer_city", "gift_note", "count", "key"] {
            query.field_conditions.push(FieldCondition {
                field: field.to_string(),
                comparison: Comparison::eq(1.0),
            });
        }

        let (query, dropped) = retain_known_fields(query, &schema);
        let kept: Vec<&str> = query.field_conditions.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(kept, vec!["status", "customer_city", "gift_note", "key"]);
        let dropped: Vec<&str> = dropped.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(dropped, vec!["operation", "count"]);
    }

    #[test]
    fn test_join_forces_order_scan() {
        let facts = QuestionFacts::analyze("which customer bought which product");
        let query = force_join(KeyValueQuery::new("customer:*"), &facts);
        assert_eq!(query.key_pattern, "order:*");
        assert!(query.require_joined);
    }

    #[test]
    fn test_identifier_wins_over_join() {
        let facts = QuestionFacts::analyze("customer and product for order ID 2");
        let query = correct_identifier(KeyValueQuery::new("order:*"), &facts);
        let query = force_join(query, &facts);
        assert_eq!(query.key_pattern, "customer:2");
        assert!(!has_wildcard(&query.key_pattern));
    }

    #[test]
    fn test_strip_aggregates() {
        let mut query = KeyValueQuery::new("order:*");
        for field in ["total_spending", "sum_total_price", "status", "group_by"] {
            query.field_conditions.push(FieldCondition {
                field: field.to_string(),
                comparison: Comparison::eq(1.0),
            });
        }
        let query = strip_aggregates(query);
        assert_eq!(query.field_conditions.len(), 1);
        assert_eq!(query.field_conditions[0].field, "status");
    }

    #[test]
    fn test_document_predicates_respect_entity() {
        let extracted = vec![
            (FilterName::Price, FilterClause::Compare(Comparison::gt(500.0))),
            (FilterName::City, FilterClause::Match("London".into())),
        ];

        let products = apply_document_predicates(DocumentQuery::find_all("products"), &extracted);
        assert_eq!(
            products.to_json(),
            json!({"collection": "products", "filter": {"price": {"$gt": 500}}})
        );

        let mut filter = Map::new();
        filter.insert("city".into(), json!("Paris"));
        let customers = DocumentQuery::Find {
            collection: "customers".into(),
            filter,
        };
        let customers = apply_document_predicates(customers, &extracted);
        assert_eq!(
            customers.to_json(),
            json!({"collection": "customers", "filter": {"city": "Paris"}})
        );
    }

    #[test]
    fn test_extracted_never_overrides() {
        let mut query = KeyValueQuery::new("product:*");
        query.filters.price = Some(Comparison::lt(10.0));
        let extracted = vec![(
            FilterName::Price,
            FilterClause::Compare(Comparison::new(Comparator::Gt, FilterValue::Number(500.0))),
        )];
        let query = apply_predicates(query, &extracted);
        assert_eq!(query.filters.price, Some(Comparison::lt(10.0)));
    }
}
