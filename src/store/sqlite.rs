//! SQLite adapter for the relational store contract

use std::path::{Path, PathBuf};

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags};

use super::errors::{StoreError, StoreResult};
use super::traits::{RelationalConnector, RelationalStore};
use crate::config::SqliteConfig;
use crate::executor::{ResultTable, Scalar};

/// Opens one SQLite connection per session
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
    read_only: bool,
}

impl SqliteConnector {
    /// Connector for a database file, opened read-write
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            read_only: false,
        }
    }

    /// Connector for the configured database file
    pub fn from_config(config: &SqliteConfig) -> Self {
        let connector = Self::new(&config.path);
        if config.read_only {
            connector.read_only()
        } else {
            connector
        }
    }

    /// Opens sessions with `SQLITE_OPEN_READ_ONLY`
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RelationalConnector for SqliteConnector {
    fn connect(&self) -> StoreResult<Box<dyn RelationalStore>> {
        let flags = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        };
        let connection = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            StoreError::Connect(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(Box::new(SqliteSession { connection }))
    }
}

/// An open SQLite connection; closed on drop
pub struct SqliteSession {
    connection: Connection,
}

impl SqliteSession {
    /// Wraps an existing connection (used for in-memory databases in tests)
    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }
}

impl RelationalStore for SqliteSession {
    fn execute(&self, statement: &str) -> StoreResult<ResultTable> {
        let rejected = |e: rusqlite::Error| StoreError::Rejected(e.to_string());

        let mut prepared = self.connection.prepare(statement).map_err(rejected)?;
        let columns: Vec<String> = prepared
            .column_names()
            .iter()
            .map(ToString::to_string)
            .collect();

        let mut rows = prepared.query([]).map_err(rejected)?;
        let mut table_rows = Vec::new();
        while let Some(row) = rows.next().map_err(rejected)? {
            let mut values = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                let value = row.get::<usize, SqlValue>(index).map_err(rejected)?;
                values.push(scalar_from_sql(value));
            }
            table_rows.push(values);
        }

        Ok(ResultTable::new(columns, table_rows))
    }
}

fn scalar_from_sql(value: SqlValue) -> Scalar {
    match value {
        SqlValue::Null => Scalar::Null,
        SqlValue::Integer(i) => Scalar::Int(i),
        SqlValue::Real(f) => Scalar::Float(f),
        SqlValue::Text(s) => Scalar::Text(s),
        SqlValue::Blob(bytes) => Scalar::Text(encode_hex(&bytes)),
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteSession {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE products (product_id INTEGER PRIMARY KEY, name TEXT, price REAL, img BLOB);
             INSERT INTO products VALUES (1, 'Laptop', 999.99, x'0aff');
             INSERT INTO products VALUES (2, 'Mouse', NULL, NULL);",
        )
        .unwrap();
        SqliteSession::from_connection(conn)
    }

    #[test]
    fn test_execute_maps_types() {
        let session = seeded();
        let table = session
            .execute("SELECT product_id, name, price, img FROM products ORDER BY product_id;")
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "product_id"), Some(&Scalar::Int(1)));
        assert_eq!(table.get(0, "price"), Some(&Scalar::Float(999.99)));
        assert_eq!(table.get(0, "img"), Some(&Scalar::Text("0aff".into())));
        assert_eq!(table.get(1, "price"), Some(&Scalar::Null));
    }

    #[test]
    fn test_rejected_statement() {
        let session = seeded();
        let err = session.execute("SELECT * FROM missing;").unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[test]
    fn test_from_config() {
        let config = SqliteConfig {
            path: "/data/shop.db".into(),
            read_only: true,
        };
        let connector = SqliteConnector::from_config(&config);
        assert_eq!(connector.path(), Path::new("/data/shop.db"));
        assert!(connector.read_only);
    }

    #[test]
    fn test_connect_failure() {
        let connector = SqliteConnector::new("/nonexistent/dir/db.sqlite").read_only();
        let err = connector.connect().err().unwrap();
        assert_eq!(err.code(), "NLQ_STORE_CONNECT");
    }
}
