//! Store clients for polyquery
//!
//! The three store families are reached through narrow session traits:
//!
//! - relational: `execute(statement) -> rows`
//! - document: `aggregate`, `find`, `collection_names`, `sample`
//! - key-value: `keys_matching`, `get_hash`, `type_of`
//!
//! Connectors open one session per request. Dropping the session closes it.

mod errors;
mod glob;
mod kind;
mod memory;
mod sqlite;
mod traits;

pub use errors::{StoreError, StoreResult};
pub use glob::{glob_match, has_wildcard};
pub use kind::{RelationalDialect, StoreKind, TargetSyntax};
pub use memory::{KvValue, MemoryDocumentStore, MemoryKeyValueStore};
pub use sqlite::{SqliteConnector, SqliteSession};
pub use traits::{
    DocumentConnector, DocumentStore, FieldMap, KeyType, KeyValueConnector, KeyValueStore,
    RelationalConnector, RelationalStore,
};
