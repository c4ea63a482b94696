//! Document-store execution

use serde_json::Value;
use tracing::debug;

use super::errors::{ExecutionError, ExecutorResult};
use super::result::{Execution, Record, ResultTable, Scalar};
use crate::query::DocumentQuery;
use crate::store::DocumentStore;

/// Runs a pipeline against its collection (or `root_collection`) or a
/// filter query against the named collection
pub fn execute_document(
    store: &dyn DocumentStore,
    query: &DocumentQuery,
    root_collection: &str,
) -> ExecutorResult<Execution> {
    let submitted = || query.to_json().to_string();

    let documents = match query {
        DocumentQuery::Pipeline { collection, stages } => {
            let collection = collection.as_deref().unwrap_or(root_collection);
            store
                .aggregate(collection, stages)
                .map_err(|e| ExecutionError::new(submitted(), e))?
        }
        DocumentQuery::Find { collection, filter } => store
            .find(collection, &Value::Object(filter.clone()))
            .map_err(|e| ExecutionError::new(submitted(), e))?,
    };

    let table = ResultTable::from_records(documents.iter().map(flatten).collect());
    debug!(rows = table.len(), "document query executed");
    Ok(Execution::from_table(table))
}

/// Top-level fields as cells; native identifiers become text
fn flatten(document: &Value) -> Record {
    let Value::Object(fields) = document else {
        return vec![("value".to_string(), Scalar::from_json(document))];
    };
    fields
        .iter()
        .map(|(name, value)| {
            let cell = match native_id(value) {
                Some(id) => Scalar::Text(id),
                None => Scalar::from_json(value),
            };
            (name.clone(), cell)
        })
        .collect()
}

/// `{"$oid": "..."}` and similar extended-JSON wrappers
fn native_id(value: &Value) -> Option<String> {
    let Value::Object(map) = value else {
        return None;
    };
    if map.len() != 1 {
        return None;
    }
    let (tag, inner) = map.iter().next()?;
    match (tag.as_str(), inner) {
        ("$oid" | "$uuid", Value::String(s)) => Some(s.clone()),
        ("$numberLong" | "$numberInt", Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}
