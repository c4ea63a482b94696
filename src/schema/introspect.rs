//! Schema introspection per store kind
//!
//! Every function here is read-only reflection over an already-open
//! session. Nothing is cached: callers introspect once per request.

use serde_json::Value;
use tracing::debug;

use super::records::FieldKind;
use super::types::Schema;
use crate::executor::Scalar;
use crate::store::{
    DocumentStore, KeyType, KeyValueStore, RelationalDialect, RelationalStore, StoreError,
    StoreResult,
};

const SQLITE_TABLES: &str = "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY rowid;";

const POSTGRES_COLUMNS: &str = "SELECT table_name, column_name, data_type \
     FROM information_schema.columns \
     WHERE table_schema = 'public' \
     ORDER BY table_name, ordinal_position;";

/// Pattern selecting every entity record in a key-value store
pub const RECORD_PATTERN: &str = "*:*";

/// Reflects a relational schema through the dialect's catalog
pub fn introspect_relational(
    store: &dyn RelationalStore,
    dialect: RelationalDialect,
) -> StoreResult<Schema> {
    match dialect {
        RelationalDialect::Sqlite => introspect_sqlite(store),
        RelationalDialect::Postgres => introspect_postgres(store),
    }
}

fn text_cell(cell: Option<&Scalar>) -> Option<String> {
    cell.filter(|c| !c.is_null()).map(Scalar::render)
}

fn introspect_sqlite(store: &dyn RelationalStore) -> StoreResult<Schema> {
    let tables = store.execute(SQLITE_TABLES)?;
    let mut schema = Schema::new();

    for row in 0..tables.len() {
        let Some(table) = text_cell(tables.get(row, "name")) else {
            continue;
        };
        if table.starts_with("sqlite_") {
            continue;
        }
        schema.add_entity(&table);

        let pragma = format!("PRAGMA table_info({});", quote_literal(&table));
        let columns = store.execute(&pragma)?;
        for col in 0..columns.len() {
            let Some(name) = text_cell(columns.get(col, "name")) else {
                continue;
            };
            let type_tag = text_cell(columns.get(col, "type")).unwrap_or_default();
            schema.add_field(&table, &name, &type_tag);
        }
    }

    debug!(entities = schema.len(), "sqlite schema introspected");
    Ok(schema)
}

fn introspect_postgres(store: &dyn RelationalStore) -> StoreResult<Schema> {
    let rows = store.execute(POSTGRES_COLUMNS)?;
    let mut schema = Schema::new();

    for row in 0..rows.len() {
        let cells = (
            text_cell(rows.get(row, "table_name")),
            text_cell(rows.get(row, "column_name")),
            text_cell(rows.get(row, "data_type")),
        );
        if let (Some(table), Some(column), data_type) = cells {
            schema.add_field(&table, &column, &data_type.unwrap_or_default());
        }
    }

    debug!(entities = schema.len(), "postgres schema introspected");
    Ok(schema)
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Reflects a document schema from the first document of each collection.
///
/// Empty collections are omitted. `_id` is never reported.
pub fn introspect_documents(store: &dyn DocumentStore) -> StoreResult<Schema> {
    let mut schema = Schema::new();

    for collection in store.collection_names()? {
        let Some(sample) = store.sample(&collection)? else {
            continue;
        };
        let Value::Object(fields) = sample else {
            continue;
        };
        schema.add_entity(&collection);
        for (name, value) in &fields {
            if name == "_id" {
                continue;
            }
            schema.add_field(&collection, name, json_type_name(value));
        }
    }

    debug!(entities = schema.len(), "document schema introspected");
    Ok(schema)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Reflects a key-value schema from every `<prefix>:<id>` hash record.
///
/// Field names are merged across all records sharing a prefix, in
/// first-seen order. Keys that do not hold a hash are skipped.
pub fn introspect_key_value(store: &dyn KeyValueStore) -> StoreResult<Schema> {
    let mut schema = Schema::new();

    for key in store.keys_matching(RECORD_PATTERN)? {
        let Some((prefix, _)) = key.split_once(':') else {
            continue;
        };
        match store.type_of(&key)? {
            KeyType::Hash => {}
            _ => continue,
        }
        let fields = match store.get_hash(&key) {
            Ok(fields) => fields,
            // Key changed type between the two calls
            Err(StoreError::Rejected(_)) => continue,
            Err(e) => return Err(e),
        };
        schema.add_entity(prefix);
        for (field, _) in &fields {
            schema.add_field(prefix, field, FieldKind::of(prefix, field).type_name());
        }
    }

    debug!(entities = schema.len(), "key-value schema introspected");
    Ok(schema)
}
