//! Database-agnostic row and value types.
//!
//! `Value` is used in both directions: drivers decode result cells into it,
//! and the statement builder renders caller-supplied values from it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unified value type for statement inputs and result cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// NULL value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit unsigned integer (MySQL `BIGINT UNSIGNED`)
    UInt64(u64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// Text/string value
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date without time
    Date(NaiveDate),
    /// Time without date
    Time(NaiveTime),
    /// Date and time without timezone
    DateTime(NaiveDateTime),
    /// Date and time with timezone (stored as UTC)
    DateTimeTz(DateTime<Utc>),
    /// Decimal/numeric with arbitrary precision
    Decimal(Decimal),
    /// UUID
    Uuid(Uuid),
    /// JSON value
    Json(serde_json::Value),
    /// Driver-specific type that doesn't map to a standard type.
    Other {
        /// The driver-specific type name
        type_name: String,
        /// String representation for display
        display: String,
    },
}

impl Value {
    /// Render the raw text that goes inside a SQL literal.
    ///
    /// Booleans become `1`/`0`, temporal values use the `YYYY-MM-DD HH:MM:SS`
    /// layout both MySQL and SQLite accept, bytes become lowercase hex digits
    /// (see `to_sql_literal` for the `X'..'` form). The result is NOT escaped.
    pub fn to_literal_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => "0".to_string(),
            Value::Int16(v) => v.to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::UInt64(v) => v.to_string(),
            Value::Float32(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => hex::encode(b),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            Value::DateTimeTz(dt) => dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Uuid(u) => u.to_string(),
            Value::Json(j) => j.to_string(),
            Value::Other { display, .. } => display.clone(),
        }
    }

    /// Render a complete SQL literal: `NULL`, `X'<hex>'` for bytes, otherwise
    /// the literal text escaped by `escape` and single-quoted.
    pub fn to_sql_literal(&self, escape: impl Fn(&str) -> String) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bytes(b) => format!("X'{}'", hex::encode(b)),
            other => format!("'{}'", escape(&other.to_literal_string())),
        }
    }

    /// Try to extract as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Metadata about a column in a query result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Driver-specific type name
    pub type_name: String,
    /// Column position (0-indexed)
    pub ordinal: usize,
}

impl ColumnInfo {
    /// Create a new column info
    pub fn new(name: String, type_name: String, ordinal: usize) -> Self {
        Self {
            name,
            type_name,
            ordinal,
        }
    }
}

/// A cell in a query result row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// The value of this cell
    pub value: Value,
    /// The column index (0-indexed)
    pub column_index: usize,
}

impl Cell {
    /// Create a new cell
    pub fn new(value: Value, column_index: usize) -> Self {
        Self { value, column_index }
    }
}

/// A row of cells from a query result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// The cells in this row
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create a new row from cells
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Create a row from values (auto-assigns column indices)
    pub fn from_values(values: Vec<Value>) -> Self {
        let cells = values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| Cell::new(value, idx))
            .collect();
        Self { cells }
    }

    /// Get a value by index
    pub fn get_value(&self, index: usize) -> Option<&Value> {
        self.cells.get(index).map(|c| &c.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(s: &str) -> String {
        s.replace('\'', "''")
    }

    #[test]
    fn test_literal_string_for_statements() {
        assert_eq!(Value::Bool(true).to_literal_string(), "1");
        assert_eq!(Value::Bool(false).to_literal_string(), "0");
        assert_eq!(Value::UInt64(u64::MAX).to_literal_string(), u64::MAX.to_string());

        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        assert_eq!(Value::DateTime(dt).to_literal_string(), "2024-03-09 14:05:00");
        assert_eq!(
            Value::Json(serde_json::json!({"a": 1})).to_literal_string(),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn test_sql_literal_quotes_and_escapes() {
        assert_eq!(Value::Null.to_sql_literal(quote), "NULL");
        assert_eq!(Value::Int32(40).to_sql_literal(quote), "'40'");
        assert_eq!(Value::from("it's").to_sql_literal(quote), "'it''s'");
    }

    #[test]
    fn test_bytes_render_as_hex_literal() {
        let bytes = Value::Bytes(vec![0xff, 0x00, 0x80]);
        assert_eq!(bytes.to_literal_string(), "ff0080");
        assert_eq!(bytes.to_sql_literal(quote), "X'ff0080'");
        assert_eq!(Value::Bytes(vec![]).to_sql_literal(quote), "X''");
    }

    #[test]
    fn test_value_from_option() {
        let some_val: Value = Some(42i32).into();
        assert_eq!(some_val, Value::Int32(42));

        let none_val: Value = Option::<i32>::None.into();
        assert_eq!(none_val, Value::Null);
    }

    #[test]
    fn test_row_from_values() {
        let row = Row::from_values(vec![
            Value::Int32(1),
            Value::Text("hello".to_string()),
            Value::Bool(true),
        ]);

        assert_eq!(row.cells.len(), 3);
        assert_eq!(row.cells[2].column_index, 2);
        assert_eq!(row.get_value(1), Some(&Value::Text("hello".to_string())));
        assert_eq!(row.get_value(3), None);
    }
}
