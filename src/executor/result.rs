//! Tabular results shared by every executor
//!
//! A result table has one ordered column set. Rows are positional vectors
//! aligned with that set, so a missing value is always an explicit `Null`.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::errors::{DecodeWarning, PredicateError};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Converts a JSON value into a cell.
    ///
    /// Booleans become integers; arrays and objects are kept as their JSON
    /// text so the column stays scalar.
    pub fn from_json(value: &Value) -> Scalar {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Int(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Null),
            },
            Value::String(s) => Scalar::Text(s.clone()),
            other => Scalar::Text(other.to_string()),
        }
    }

    /// Numeric view of the cell; text is parsed leniently
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Null => None,
        }
    }

    /// Text view of the cell (only for `Text`)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Renders the cell for display and grouping
    pub fn render(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

/// An unaligned row: ordered (column, value) pairs
pub type Record = Vec<(String, Scalar)>;

/// Ordered rows over a uniform column set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
}

impl ResultTable {
    /// Creates an empty table
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a table from an explicit column set and aligned rows.
    ///
    /// Short rows are padded with `Null`; long rows are truncated.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Scalar>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Scalar::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Builds a table from unaligned records.
    ///
    /// The column set is the union of all record columns in first-seen
    /// order; absent values become `Null`.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for (name, _) in record {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = vec![Scalar::Null; columns.len()];
                for (name, value) in record {
                    if let Some(idx) = columns.iter().position(|c| *c == name) {
                        row[idx] = value;
                    }
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Returns the column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell at `row` in `column`
    pub fn get(&self, row: usize, column: &str) -> Option<&Scalar> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Renders the table as a JSON array of objects
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Scalar],
}

impl Serialize for RowRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl Serialize for ResultTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for values in &self.rows {
            seq.serialize_element(&RowRef {
                columns: &self.columns,
                values,
            })?;
        }
        seq.end()
    }
}

/// Side information gathered while executing one query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionStats {
    /// Keys skipped because they did not hold a hash
    pub records_skipped: u64,
    /// Fields kept as raw text
    pub decode_warnings: Vec<DecodeWarning>,
    /// Set when a filter could not be evaluated; the table is then empty
    pub predicate_error: Option<PredicateError>,
    /// Result transform applied, if any
    pub shape: Option<&'static str>,
}

/// A result table plus execution stats
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Execution {
    pub table: ResultTable,
    pub stats: ExecutionStats,
}

impl Execution {
    /// Execution with no side information
    pub fn from_table(table: ResultTable) -> Self {
        Self {
            table,
            stats: ExecutionStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_records_fills_missing_with_null() {
        let table = ResultTable::from_records(vec![
            vec![("a".into(), Scalar::Int(1))],
            vec![("b".into(), Scalar::from("x")), ("a".into(), Scalar::Int(2))],
        ]);

        assert_eq!(table.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(table.get(0, "b"), Some(&Scalar::Null));
        assert_eq!(table.get(1, "a"), Some(&Scalar::Int(2)));
        assert_eq!(table.get(1, "missing"), None);
    }

    #[test]
    fn test_empty_table() {
        let table = ResultTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
        assert_eq!(table.to_json(), json!([]));
    }

    #[test]
    fn test_serialize_keeps_column_order() {
        let table = ResultTable::new(
            vec!["zeta".into(), "alpha".into()],
            vec![vec![Scalar::Float(1.5)]],
        );

        let text = serde_json::to_string(&table).unwrap();
        assert_eq!(text, r#"[{"zeta":1.5,"alpha":null}]"#);
    }

    #[test]
    fn test_scalar_from_json() {
        assert_eq!(Scalar::from_json(&json!(true)), Scalar::Int(1));
        assert_eq!(Scalar::from_json(&json!(2.5)), Scalar::Float(2.5));
        assert_eq!(Scalar::from_json(&json!([1, 2])), Scalar::Text("[1,2]".into()));
        assert_eq!(Scalar::from("12.5").as_f64(), Some(12.5));
        assert_eq!(Scalar::from("n/a").as_f64(), None);
    }
}
