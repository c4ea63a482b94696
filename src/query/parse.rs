//! Parsing sanitized text into structured queries
//!
//! Only the first complete JSON value is read; trailing prose after it is
//! ignored.

use serde_json::{Map, Value};

use super::ast::{
    Comparator, Comparison, DocumentQuery, FieldCondition, FilterClause, FilterName, FilterValue,
    KeyValueQuery, RelationalQuery, StructuredQuery,
};
use super::errors::{MalformedQueryError, QueryResult};
use crate::store::StoreKind;

/// Keys of the key-value form that are never filters
const RESERVED_KEYS: &[&str] = &[
    "key", "filters", "require_joined", "limit", "sort", "fields", "type", "command",
];

/// Words a relational statement may start with
const STATEMENT_KEYWORDS: &[&str] = &["SELECT", "INSERT", "UPDATE", "DELETE", "CREATE", "ALTER", "DROP"];

/// Parses sanitized text for the given store kind
pub fn parse(kind: StoreKind, clean: &str) -> QueryResult<StructuredQuery> {
    match kind {
        StoreKind::Sqlite | StoreKind::Postgres => {
            Ok(StructuredQuery::Relational(parse_relational(clean)?))
        }
        StoreKind::Document => Ok(StructuredQuery::Document(parse_document(clean)?)),
        StoreKind::KeyValue => Ok(StructuredQuery::KeyValue(parse_key_value(clean)?)),
    }
}

/// Relational text is passed through once it is non-empty and starts with a
/// statement keyword
pub fn parse_relational(clean: &str) -> QueryResult<RelationalQuery> {
    let statement = clean.trim();
    if statement.trim_end_matches(';').trim().is_empty() {
        return Err(MalformedQueryError::new("empty statement"));
    }
    let first = statement
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    if !STATEMENT_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(first)) {
        return Err(MalformedQueryError::new(format!(
            "statement does not start with a keyword: {:?}",
            first
        )));
    }
    Ok(RelationalQuery::new(statement))
}

fn first_value(text: &str) -> QueryResult<Value> {
    let mut values = serde_json::Deserializer::from_str(text).into_iter::<Value>();
    match values.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => Err(MalformedQueryError::new(e.to_string())),
        None => Err(MalformedQueryError::new("no JSON value")),
    }
}

/// Parses the document form: a bare pipeline array, `{"pipeline": [...]}`
/// or `{"collection": ..., "filter": {...}}`
pub fn parse_document(clean: &str) -> QueryResult<DocumentQuery> {
    match first_value(clean)? {
        Value::Array(stages) => Ok(DocumentQuery::Pipeline {
            collection: None,
            stages,
        }),
        Value::Object(mut obj) => {
            let collection = match obj.remove("collection") {
                Some(Value::String(c)) if !c.trim().is_empty() => Some(c.trim().to_string()),
                Some(Value::String(_)) | None => None,
                Some(other) => {
                    return Err(MalformedQueryError::new(format!(
                        "collection must be a string, got {}",
                        other
                    )))
                }
            };

            if let Some(pipeline) = obj.remove("pipeline") {
                let Value::Array(stages) = pipeline else {
                    return Err(MalformedQueryError::new("pipeline must be an array"));
                };
                return Ok(DocumentQuery::Pipeline { collection, stages });
            }

            let Some(collection) = collection else {
                return Err(MalformedQueryError::new("missing collection"));
            };
            let filter = match obj.remove("filter") {
                Some(Value::Object(filter)) => filter,
                None | Some(Value::Null) => Map::new(),
                Some(other) => {
                    return Err(MalformedQueryError::new(format!(
                        "filter must be an object, got {}",
                        other
                    )))
                }
            };
            Ok(DocumentQuery::Find { collection, filter })
        }
        other => Err(MalformedQueryError::new(format!(
            "expected an object or array, got {}",
            other
        ))),
    }
}

/// Parses the key-value form `{"key": <pattern>, <filters>...}`.
///
/// Filters may sit at the top level or under a `"filters"` object. Keys
/// naming a filter slot fill that slot; any other key becomes a field
/// condition.
pub fn parse_key_value(clean: &str) -> QueryResult<KeyValueQuery> {
    let obj = match first_value(clean)? {
        Value::Object(obj) => obj,
        Value::Array(items) => match items.into_iter().next() {
            Some(Value::Object(obj)) => obj,
            _ => return Err(MalformedQueryError::new("expected a key object")),
        },
        other => {
            return Err(MalformedQueryError::new(format!(
                "expected an object, got {}",
                other
            )))
        }
    };

    let key_pattern = match obj.get("key") {
        Some(Value::String(key)) if !key.trim().is_empty() => key.trim().to_string(),
        _ => return Err(MalformedQueryError::new("missing or empty key")),
    };

    let mut query = KeyValueQuery::new(key_pattern);
    query.require_joined = obj
        .get("require_joined")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let nested = match obj.get("filters") {
        Some(Value::Object(nested)) => Some(nested),
        _ => None,
    };
    let entries = obj
        .iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .chain(nested.into_iter().flatten());

    for (key, value) in entries {
        match FilterName::from_key(key) {
            Some(name) => {
                if let Some(clause) = slot_clause(name, value) {
                    query.filters.set_if_absent(name, clause);
                }
            }
            None => query
                .field_conditions
                .extend(field_conditions(key, value)),
        }
    }

    Ok(query)
}

fn typed_operand(name: FilterName, value: &Value) -> FilterValue {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(n) if !name.is_date() => FilterValue::Number(n),
            _ => FilterValue::Text(n.to_string()),
        },
        Value::String(s) if name.is_date() => FilterValue::date_from_str(s),
        Value::String(s) => FilterValue::number_from_str(s),
        other => FilterValue::Text(other.to_string()),
    }
}

fn slot_clause(name: FilterName, value: &Value) -> Option<FilterClause> {
    if value.is_null() {
        return None;
    }
    if name.is_categorical() {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Some(FilterClause::Match(text));
    }

    let comparison = match value {
        Value::Object(ops) => ops
            .iter()
            .find_map(|(op, operand)| {
                Comparator::from_key(op).map(|c| Comparison::new(c, typed_operand(name, operand)))
            })
            // Operator object with nothing usable is kept so evaluation rejects it
            .unwrap_or_else(|| {
                Comparison::new(Comparator::Eq, FilterValue::Text(value.to_string()))
            }),
        scalar => Comparison::new(Comparator::Eq, typed_operand(name, scalar)),
    };
    Some(FilterClause::Compare(comparison))
}

fn untyped_operand(value: &Value) -> Option<FilterValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(FilterValue::Number(f64::from(u8::from(*b)))),
        Value::Number(n) => n.as_f64().map(FilterValue::Number),
        Value::String(s) => Some(FilterValue::Text(s.clone())),
        other => Some(FilterValue::Text(other.to_string())),
    }
}

fn field_conditions(field: &str, value: &Value) -> Vec<FieldCondition> {
    let condition = |comparison| FieldCondition {
        field: field.to_string(),
        comparison,
    };

    if let Value::Object(ops) = value {
        let parsed: Vec<FieldCondition> = ops
            .iter()
            .filter_map(|(op, operand)| {
                let comparator = Comparator::from_key(op)?;
                let operand = untyped_operand(operand)?;
                Some(condition(Comparison::new(comparator, operand)))
            })
            .collect();
        if !parsed.is_empty() {
            return parsed;
        }
    }

    match untyped_operand(value) {
        Some(operand) => vec![condition(Comparison::new(Comparator::Eq, operand))],
        None => Vec::new(),
    }
}
