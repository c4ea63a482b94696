//! In-process document and key-value stores
//!
//! Both stores keep their data behind `Arc<RwLock<..>>` so every session
//! opened by the connector sees the same data. Each store counts its open
//! sessions, which lets callers verify that a request released its session.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use super::glob::glob_match;
use super::traits::{
    DocumentConnector, DocumentStore, FieldMap, KeyType, KeyValueConnector, KeyValueStore,
};

/// Live-session counter shared between a store and its sessions
#[derive(Debug, Default)]
struct SessionCounter(AtomicUsize);

/// Decrements the counter when the owning session is dropped
#[derive(Debug)]
struct SessionGuard(Arc<SessionCounter>);

impl SessionGuard {
    fn acquire(counter: &Arc<SessionCounter>) -> Self {
        counter.0.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0 .0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

// ============================================================================
// Key-value store
// ============================================================================

/// A value held under one key
#[derive(Debug, Clone, PartialEq)]
pub enum KvValue {
    Hash(FieldMap),
    String(String),
    List(Vec<String>),
    Set(Vec<String>),
    /// Members with their scores
    SortedSet(Vec<(String, f64)>),
}

impl KvValue {
    fn key_type(&self) -> KeyType {
        match self {
            KvValue::Hash(_) => KeyType::Hash,
            KvValue::String(_) => KeyType::String,
            KvValue::List(_) => KeyType::List,
            KvValue::Set(_) => KeyType::Set,
            KvValue::SortedSet(_) => KeyType::SortedSet,
        }
    }
}

/// In-memory key-value store with Redis glob semantics
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<BTreeMap<String, KvValue>>>,
    sessions: Arc<SessionCounter>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets hash fields on a key, replacing any non-hash value
    pub fn hset<K, V>(&self, key: &str, fields: impl IntoIterator<Item = (K, V)>) -> StoreResult<()>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| KvValue::Hash(Vec::new()));
        if !matches!(entry, KvValue::Hash(_)) {
            *entry = KvValue::Hash(Vec::new());
        }
        if let KvValue::Hash(existing) = entry {
            for (field, value) in fields {
                let (field, value) = (field.into(), value.into());
                match existing.iter_mut().find(|(f, _)| *f == field) {
                    Some(slot) => slot.1 = value,
                    None => existing.push((field, value)),
                }
            }
        }
        Ok(())
    }

    /// Stores a non-hash value under a key
    pub fn set(&self, key: &str, value: KvValue) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    /// Number of sessions currently open
    pub fn open_sessions(&self) -> usize {
        self.sessions.0.load(Ordering::SeqCst)
    }
}

impl KeyValueConnector for MemoryKeyValueStore {
    fn connect(&self) -> StoreResult<Box<dyn KeyValueStore>> {
        Ok(Box::new(MemoryKeyValueSession {
            entries: Arc::clone(&self.entries),
            _guard: SessionGuard::acquire(&self.sessions),
        }))
    }
}

struct MemoryKeyValueSession {
    entries: Arc<RwLock<BTreeMap<String, KvValue>>>,
    _guard: SessionGuard,
}

impl KeyValueStore for MemoryKeyValueSession {
    fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect())
    }

    fn get_hash(&self, key: &str) -> StoreResult<FieldMap> {
        let entries = self.entries.read().map_err(poisoned)?;
        match entries.get(key) {
            Some(KvValue::Hash(fields)) => Ok(fields.clone()),
            Some(other) => Err(StoreError::Rejected(format!(
                "WRONGTYPE key '{}' holds a {}",
                key,
                other.key_type().as_str()
            ))),
            None => Ok(Vec::new()),
        }
    }

    fn type_of(&self, key: &str) -> StoreResult<KeyType> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).map(KvValue::key_type).unwrap_or(KeyType::None))
    }
}

// ============================================================================
// Document store
// ============================================================================

/// In-memory document store with a Mongo-style filter subset
///
/// Filters: field equality, `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`,
/// `$in`, `$and`, `$or`, dotted field paths.
/// Pipeline stages: `$match`, `$sort`, `$limit`, `$skip`, `$project`.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<BTreeMap<String, Vec<Value>>>>,
    sessions: Arc<SessionCounter>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a document to a collection, creating it if needed
    pub fn insert(&self, collection: &str, document: Value) -> StoreResult<()> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    /// Number of sessions currently open
    pub fn open_sessions(&self) -> usize {
        self.sessions.0.load(Ordering::SeqCst)
    }
}

impl DocumentConnector for MemoryDocumentStore {
    fn connect(&self) -> StoreResult<Box<dyn DocumentStore>> {
        Ok(Box::new(MemoryDocumentSession {
            collections: Arc::clone(&self.collections),
            _guard: SessionGuard::acquire(&self.sessions),
        }))
    }
}

struct MemoryDocumentSession {
    collections: Arc<RwLock<BTreeMap<String, Vec<Value>>>>,
    _guard: SessionGuard,
}

impl MemoryDocumentSession {
    fn documents(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }
}

impl DocumentStore for MemoryDocumentSession {
    fn collection_names(&self) -> StoreResult<Vec<String>> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections.keys().cloned().collect())
    }

    fn sample(&self, collection: &str) -> StoreResult<Option<Value>> {
        Ok(self.documents(collection)?.into_iter().next())
    }

    fn find(&self, collection: &str, filter: &Value) -> StoreResult<Vec<Value>> {
        let filter = filter_object(filter)?;
        let mut matched = Vec::new();
        for doc in self.documents(collection)? {
            if matches_filter(&doc, filter)? {
                matched.push(doc);
            }
        }
        Ok(matched)
    }

    fn aggregate(&self, collection: &str, stages: &[Value]) -> StoreResult<Vec<Value>> {
        let mut docs = self.documents(collection)?;
        for stage in stages {
            docs = apply_stage(docs, stage)?;
        }
        Ok(docs)
    }
}

fn filter_object(filter: &Value) -> StoreResult<&Map<String, Value>> {
    static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
    match filter {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(EMPTY.get_or_init(Map::new)),
        other => Err(StoreError::Rejected(format!(
            "filter must be an object, got {}",
            other
        ))),
    }
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, part| current.get(part))
}

fn matches_filter(doc: &Value, filter: &Map<String, Value>) -> StoreResult<bool> {
    for (field, condition) in filter {
        let ok = match field.as_str() {
            "$and" => all_clauses(doc, condition, true)?,
            "$or" => all_clauses(doc, condition, false)?,
            _ => matches_condition(lookup(doc, field), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn all_clauses(doc: &Value, clauses: &Value, conjunction: bool) -> StoreResult<bool> {
    let Value::Array(clauses) = clauses else {
        return Err(StoreError::Rejected("$and/$or expect an array".to_string()));
    };
    let mut results = Vec::with_capacity(clauses.len());
    for clause in clauses {
        results.push(matches_filter(doc, filter_object(clause)?)?);
    }
    Ok(if conjunction {
        results.iter().all(|r| *r)
    } else {
        results.iter().any(|r| *r)
    })
}

fn matches_condition(actual: Option<&Value>, condition: &Value) -> StoreResult<bool> {
    let operators = match condition {
        Value::Object(map) if map.keys().all(|k| k.starts_with('$')) && !map.is_empty() => map,
        expected => return Ok(actual == Some(expected)),
    };

    for (op, operand) in operators {
        let ok = match op.as_str() {
            "$eq" => actual == Some(operand),
            "$ne" => actual != Some(operand),
            "$gt" => compare(actual, operand).is_some_and(|o| o.is_gt()),
            "$gte" => compare(actual, operand).is_some_and(|o| o.is_ge()),
            "$lt" => compare(actual, operand).is_some_and(|o| o.is_lt()),
            "$lte" => compare(actual, operand).is_some_and(|o| o.is_le()),
            "$in" => match operand {
                Value::Array(options) => actual.is_some_and(|a| options.contains(a)),
                _ => return Err(StoreError::Rejected("$in expects an array".to_string())),
            },
            unknown => {
                return Err(StoreError::Rejected(format!("unknown operator {}", unknown)));
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn compare(actual: Option<&Value>, bound: &Value) -> Option<std::cmp::Ordering> {
    match (actual?, bound) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn sort_cmp(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare(Some(x), y).unwrap_or(Ordering::Equal),
    }
}

fn apply_stage(mut docs: Vec<Value>, stage: &Value) -> StoreResult<Vec<Value>> {
    let Some((name, operand)) = stage.as_object().and_then(|s| s.iter().next()) else {
        return Err(StoreError::Rejected(format!("invalid pipeline stage: {}", stage)));
    };

    match name.as_str() {
        "$match" => {
            let filter = filter_object(operand)?;
            let mut kept = Vec::new();
            for doc in docs {
                if matches_filter(&doc, filter)? {
                    kept.push(doc);
                }
            }
            Ok(kept)
        }
        "$sort" => {
            let keys = filter_object(operand)?;
            docs.sort_by(|a, b| {
                for (field, direction) in keys {
                    let ord = sort_cmp(lookup(a, field), lookup(b, field));
                    let ord = if direction.as_i64() == Some(-1) { ord.reverse() } else { ord };
                    if ord.is_ne() {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            });
            Ok(docs)
        }
        "$limit" => {
            let n = count_operand(name, operand)?;
            docs.truncate(n);
            Ok(docs)
        }
        "$skip" => {
            let n = count_operand(name, operand)?;
            Ok(docs.into_iter().skip(n).collect())
        }
        "$project" => {
            let fields = filter_object(operand)?;
            Ok(docs.iter().map(|doc| project(doc, fields)).collect())
        }
        unknown => Err(StoreError::Rejected(format!(
            "unsupported pipeline stage {}",
            unknown
        ))),
    }
}

fn count_operand(stage: &str, operand: &Value) -> StoreResult<usize> {
    operand.as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| StoreError::Rejected(format!("{} expects a non-negative integer", stage)))
}

fn project(doc: &Value, fields: &Map<String, Value>) -> Value {
    let included: Vec<&String> = fields
        .iter()
        .filter(|(_, v)| v.as_i64() == Some(1) || v.as_bool() == Some(true))
        .map(|(k, _)| k)
        .collect();
    let excluded: Vec<&String> = fields
        .iter()
        .filter(|(_, v)| v.as_i64() == Some(0) || v.as_bool() == Some(false))
        .map(|(k, _)| k)
        .collect();

    let Some(source) = doc.as_object() else {
        return doc.clone();
    };

    let mut out = Map::new();
    for (key, value) in source {
        let keep = if included.is_empty() {
            !excluded.contains(&key)
        } else {
            (included.contains(&key) || key == "_id") && !excluded.contains(&key)
        };
        if keep {
            out.insert(key.clone(), value.clone());
        }
    }
    Value::Object(out)
}
