//! Relational execution (SQLite and Postgres dialects)

use tracing::debug;

use super::errors::{ExecutionError, ExecutorResult};
use super::result::Execution;
use crate::query::RelationalQuery;
use crate::store::RelationalStore;

/// Runs the statement and returns every row
pub fn execute_relational(
    store: &dyn RelationalStore,
    query: &RelationalQuery,
) -> ExecutorResult<Execution> {
    let table = store
        .execute(&query.statement)
        .map_err(|e| ExecutionError::new(query.statement.clone(), e))?;
    debug!(rows = table.len(), columns = table.columns().len(), "statement executed");
    Ok(Execution::from_table(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteSession;

    #[test]
    fn test_error_carries_statement() {
        let session = SqliteSession::from_connection(rusqlite::Connection::open_in_memory().unwrap());
        let query = RelationalQuery::new("SELECT * FROM missing;");
        let err = execute_relational(&session, &query).unwrap_err();
        assert_eq!(err.query, "SELECT * FROM missing;");
    }
}
