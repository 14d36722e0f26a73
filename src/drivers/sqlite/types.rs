//! SQLite type conversion and escaping.
//!
//! SQLite uses dynamic typing with type affinity, so the declared column type
//! only picks the first decode attempt; values stored under a different
//! storage class fall back to text.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::sqlite::{SqliteColumn, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::traits::{Cell, ColumnInfo, Row as TraitRow, Value};

/// Escape a string for use inside a single-quoted SQLite literal.
pub fn escape_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Converter for SQLite values to the unified `Value` type.
pub struct SqliteValueConverter;

impl SqliteValueConverter {
    /// Convert a SQLite row to a trait Row.
    pub fn convert_row(sqlite_row: &SqliteRow) -> TraitRow {
        let cells = sqlite_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| Cell::new(Self::extract_value(sqlite_row, col, idx), idx))
            .collect();

        TraitRow::new(cells)
    }

    /// Build column info from a SQLite row.
    pub fn build_column_info(sqlite_row: &SqliteRow) -> Vec<ColumnInfo> {
        sqlite_row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                ColumnInfo::new(
                    col.name().to_string(),
                    col.type_info().name().to_string(),
                    idx,
                )
            })
            .collect()
    }

    fn extract_value(row: &SqliteRow, column: &SqliteColumn, index: usize) -> Value {
        match row.try_get_raw(index) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Err(_) => return Value::Null,
            _ => {}
        }

        let type_name = column.type_info().name().to_uppercase();
        Self::decode_by_type(row, index, &type_name)
    }

    fn decode_by_type(row: &SqliteRow, index: usize, type_name: &str) -> Value {
        match type_name {
            "INTEGER" | "INT" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "BIGINT" | "INT2"
            | "INT8" => row
                .try_get::<i64, _>(index)
                .map(Value::Int64)
                .unwrap_or_else(|_| Self::decode_unknown(row, index, type_name)),

            "BOOLEAN" | "BOOL" => row
                .try_get::<bool, _>(index)
                .map(Value::Bool)
                .or_else(|_| row.try_get::<i64, _>(index).map(|v| Value::Bool(v != 0)))
                .unwrap_or(Value::Null),

            "REAL" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" => row
                .try_get::<f64, _>(index)
                .map(Value::Float64)
                .unwrap_or_else(|_| Self::decode_unknown(row, index, type_name)),

            "TEXT" | "VARCHAR" | "NVARCHAR" | "CLOB" | "CHARACTER" | "CHAR" => row
                .try_get::<String, _>(index)
                .map(Value::Text)
                .unwrap_or_else(|_| Self::decode_unknown(row, index, type_name)),

            "BLOB" => row
                .try_get::<Vec<u8>, _>(index)
                .map(Value::Bytes)
                .unwrap_or(Value::Null),

            "DATE" => Self::decode_text_as(row, index, type_name, |s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Value::Date)
            }),

            "TIME" => Self::decode_text_as(row, index, type_name, |s| {
                NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
                    .ok()
                    .map(Value::Time)
            }),

            "DATETIME" | "TIMESTAMP" => Self::decode_text_as(row, index, type_name, |s| {
                ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(Value::DateTime)
            }),

            "NUMERIC" | "DECIMAL" => Self::decode_text_as(row, index, type_name, |s| {
                s.parse::<rust_decimal::Decimal>().ok().map(Value::Decimal)
            }),

            _ => Self::decode_unknown(row, index, type_name),
        }
    }

    /// Parse the text representation, keeping the raw text when parsing fails.
    fn decode_text_as(
        row: &SqliteRow,
        index: usize,
        type_name: &str,
        parse: impl Fn(&str) -> Option<Value>,
    ) -> Value {
        match row.try_get::<String, _>(index) {
            Ok(s) => parse(&s).unwrap_or(Value::Text(s)),
            Err(_) => Self::decode_unknown(row, index, type_name),
        }
    }

    /// Decode by storage class when the declared type doesn't help.
    fn decode_unknown(row: &SqliteRow, index: usize, type_name: &str) -> Value {
        if let Ok(v) = row.try_get::<i64, _>(index) {
            return Value::Int64(v);
        }
        if let Ok(v) = row.try_get::<f64, _>(index) {
            return Value::Float64(v);
        }
        if let Ok(v) = row.try_get::<String, _>(index) {
            return Value::Text(v);
        }
        if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
            return Value::Bytes(v);
        }

        Value::Other {
            type_name: type_name.to_string(),
            display: "<unknown>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_doubles_single_quotes() {
        assert_eq!(escape_string("O'Brien"), "O''Brien");
        assert_eq!(escape_string("''"), "''''");
    }

    #[test]
    fn test_escape_leaves_backslashes() {
        assert_eq!(escape_string("C:\\temp"), "C:\\temp");
        assert_eq!(escape_string("users"), "users");
    }
}
