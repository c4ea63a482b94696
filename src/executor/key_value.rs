//! Key-value execution with application-side join, filter and aggregation
//!
//! # Execution Flow (strict order)
//!
//! 1. Expand the key pattern; no keys means an empty table
//! 2. Fetch each hash; keys of any other type are skipped
//! 3. Decode fields by the record type map, falling back to raw text
//! 4. Resolve `customer_id` / `product_id` references and merge the
//!    counterpart's fields as `<entity>_<field>`
//! 5. Apply every filter (AND); a coercion failure yields an empty table
//! 6. Apply at most one result transform

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::decode::{decode_fields, key_prefix};
use super::errors::{ExecutionError, ExecutorResult};
use super::filters::PredicateFilter;
use super::result::{Execution, ExecutionStats, Record, ResultTable, Scalar};
use super::shape::Shape;
use crate::observability::Event;
use crate::query::KeyValueQuery;
use crate::schema::Entity;
use crate::store::{KeyType, KeyValueStore, StoreError};

/// Entities whose references are resolved, in merge order
const REFERENCED: [Entity; 2] = [Entity::Customer, Entity::Product];

/// Sorts keys by prefix, then numerically by id where the id is a number
fn natural_order(keys: &mut [String]) {
    keys.sort_by(|a, b| {
        let split = |k: &str| {
            let (prefix, id) = k.split_once(':').unwrap_or((k, ""));
            (prefix.to_string(), id.parse::<u64>().ok(), id.to_string())
        };
        let (pa, na, ia) = split(a);
        let (pb, nb, ib) = split(b);
        pa.cmp(&pb)
            .then_with(|| match (na, nb) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| ia.cmp(&ib))
    });
}

/// Evaluates key-value queries against one session
pub struct KeyValueExecutor<'a> {
    store: &'a dyn KeyValueStore,
    /// Counterpart records already fetched, by key
    counterparts: HashMap<String, Option<Record>>,
    stats: ExecutionStats,
    submitted: String,
}

impl<'a> KeyValueExecutor<'a> {
    pub fn new(store: &'a dyn KeyValueStore, query: &KeyValueQuery) -> Self {
        Self {
            store,
            counterparts: HashMap::new(),
            stats: ExecutionStats::default(),
            submitted: query.to_json().to_string(),
        }
    }

    fn failed(&self, source: StoreError) -> ExecutionError {
        ExecutionError::new(self.submitted.clone(), source)
    }

    /// Runs the full emulation for `query`; `question` selects the result
    /// transform
    pub fn execute(mut self, query: &KeyValueQuery, question: &str) -> ExecutorResult<Execution> {
        let mut keys = self
            .store
            .keys_matching(&query.key_pattern)
            .map_err(|e| self.failed(e))?;
        if keys.is_empty() {
            debug!(pattern = %query.key_pattern, "no keys matched");
            return Ok(self.finish(ResultTable::empty()));
        }
        natural_order(&mut keys);

        let mut rows = Vec::with_capacity(keys.len());
        for key in &keys {
            let Some(record) = self.fetch(key)? else {
                continue;
            };
            if let Some(row) = self.resolve(key, record, query.require_joined)? {
                rows.push(row);
            }
        }

        let mut matched = Vec::with_capacity(rows.len());
        for row in rows {
            match PredicateFilter::matches(&row, query) {
                Ok(true) => matched.push(row),
                Ok(false) => {}
                Err(error) => {
                    warn!(
                        event = %Event::PredicateRejected,
                        code = error.code(),
                        field = %error.field,
                        reason = %error.reason,
                        "filter could not be evaluated; returning no rows"
                    );
                    self.stats.predicate_error = Some(error);
                    return Ok(self.finish(ResultTable::empty()));
                }
            }
        }

        let table = match Shape::detect(&question.to_lowercase()) {
            Some(shape) => {
                debug!(event = %Event::ShapeApplied, shape = shape.as_str(), rows = matched.len(), "result shaped");
                self.stats.shape = Some(shape.as_str());
                shape.apply(&matched)
            }
            None => ResultTable::from_records(matched),
        };
        Ok(self.finish(table))
    }

    fn finish(self, table: ResultTable) -> Execution {
        Execution {
            table,
            stats: self.stats,
        }
    }

    /// Fetches and decodes one hash record, prefixed with its key
    fn fetch(&mut self, key: &str) -> ExecutorResult<Option<Record>> {
        let key_type = self.store.type_of(key).map_err(|e| self.failed(e))?;
        if key_type != KeyType::Hash {
            info!(
                event = %Event::RecordSkipped,
                key = %key,
                key_type = key_type.as_str(),
                "key does not hold a hash record"
            );
            self.stats.records_skipped += 1;
            return Ok(None);
        }

        let fields = self.store.get_hash(key).map_err(|e| self.failed(e))?;
        let (decoded, warnings) = decode_fields(key, &fields);
        for warning in &warnings {
            warn!(
                event = %Event::FieldDecodeFallback,
                key = %warning.key,
                field = %warning.field,
                expected = warning.expected.type_name(),
                "field kept as raw text"
            );
        }
        self.stats.decode_warnings.extend(warnings);

        let mut record = Vec::with_capacity(decoded.len() + 1);
        record.push(("key".to_string(), Scalar::Text(key.to_string())));
        record.extend(decoded);
        Ok(Some(record))
    }

    /// Merges referenced customer and product fields into the row.
    ///
    /// Returns `None` when `require_joined` is set and a reference could not
    /// be resolved.
    fn resolve(
        &mut self,
        key: &str,
        mut row: Record,
        require_joined: bool,
    ) -> ExecutorResult<Option<Record>> {
        let own_prefix = key_prefix(key).to_string();

        for entity in REFERENCED {
            if entity.prefix() == own_prefix {
                continue;
            }
            let reference = row
                .iter()
                .find(|(name, value)| name == entity.reference_field() && !value.is_null())
                .map(|(_, value)| value.render());
            let Some(id) = reference else {
                continue;
            };

            match self.counterpart(&entity.key(id.trim()))? {
                Some(fields) => {
                    for (field, value) in fields {
                        if field == "key" || field == entity.reference_field() {
                            continue;
                        }
                        let merged = format!("{}_{}", entity.prefix(), field);
                        if !row.iter().any(|(name, _)| *name == merged) {
                            row.push((merged, value));
                        }
                    }
                }
                None if require_joined => {
                    debug!(key = %key, missing = entity.prefix(), "unjoined row dropped");
                    return Ok(None);
                }
                None => {}
            }
        }
        Ok(Some(row))
    }

    fn counterpart(&mut self, key: &str) -> ExecutorResult<Option<Record>> {
        if let Some(cached) = self.counterparts.get(key) {
            return Ok(cached.clone());
        }
        let fetched = match self.store.type_of(key).map_err(|e| self.failed(e))? {
            KeyType::Hash => {
                let fields = self.store.get_hash(key).map_err(|e| self.failed(e))?;
                let (decoded, warnings) = decode_fields(key, &fields);
                self.stats.decode_warnings.extend(warnings);
                Some(decoded)
            }
            _ => None,
        };
        self.counterparts.insert(key.to_string(), fetched.clone());
        Ok(fetched)
    }
}

/// Runs a key-value query against an open session
pub fn execute_key_value(
    store: &dyn KeyValueStore,
    query: &KeyValueQuery,
    question: &str,
) -> ExecutorResult<Execution> {
    KeyValueExecutor::new(store, query).execute(query, question)
}
