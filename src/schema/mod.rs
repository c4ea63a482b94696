//! Schema subsystem for polyquery
//!
//! A schema is rebuilt for every request from the live store and handed to
//! the generator as context. It is never persisted and never used to
//! validate results.
//!
//! # Sources
//!
//! - SQLite: `sqlite_master` + `PRAGMA table_info`
//! - Postgres: `information_schema.columns` (`public` schema)
//! - Document: first document of each collection
//! - Key-value: every `*:*` hash, grouped by key prefix

mod introspect;
mod records;
mod types;

pub use introspect::{
    introspect_documents, introspect_key_value, introspect_relational, RECORD_PATTERN,
};
pub use records::{Entity, FieldKind};
pub use types::{EntitySchema, Schema, SchemaField};
