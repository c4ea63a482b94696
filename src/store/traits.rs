//! Store client contracts
//!
//! Each backend is reached through a connector that opens one session per
//! request. Sessions are plain owned values: dropping one releases the
//! underlying connection, which makes release unconditional on every exit
//! path of a request.

use serde_json::Value;

use super::errors::StoreResult;
use crate::executor::ResultTable;

/// Ordered field/value pairs of a key-value hash record
pub type FieldMap = Vec<(String, String)>;

/// Storage type reported for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Hash,
    String,
    List,
    Set,
    SortedSet,
    /// Key does not exist
    None,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Hash => "hash",
            KeyType::String => "string",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::SortedSet => "zset",
            KeyType::None => "none",
        }
    }
}

/// An open relational session
pub trait RelationalStore: Send {
    /// Run one statement and return every row
    fn execute(&self, statement: &str) -> StoreResult<ResultTable>;
}

/// An open document-store session
pub trait DocumentStore: Send {
    /// Names of all collections
    fn collection_names(&self) -> StoreResult<Vec<String>>;

    /// First document of a collection, if any
    fn sample(&self, collection: &str) -> StoreResult<Option<Value>>;

    /// Documents of `collection` matching `filter`
    fn find(&self, collection: &str, filter: &Value) -> StoreResult<Vec<Value>>;

    /// Run an aggregation pipeline rooted at `collection`
    fn aggregate(&self, collection: &str, stages: &[Value]) -> StoreResult<Vec<Value>>;
}

/// An open key-value session
pub trait KeyValueStore: Send {
    /// Keys matching a glob pattern
    fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// All fields of a hash key; empty if the key is missing
    fn get_hash(&self, key: &str) -> StoreResult<FieldMap>;

    /// Storage type of a key
    fn type_of(&self, key: &str) -> StoreResult<KeyType>;
}

/// Opens relational sessions
pub trait RelationalConnector: Send + Sync {
    fn connect(&self) -> StoreResult<Box<dyn RelationalStore>>;
}

/// Opens document-store sessions
pub trait DocumentConnector: Send + Sync {
    fn connect(&self) -> StoreResult<Box<dyn DocumentStore>>;
}

/// Opens key-value sessions
pub trait KeyValueConnector: Send + Sync {
    fn connect(&self) -> StoreResult<Box<dyn KeyValueStore>>;
}
