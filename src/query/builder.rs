//! CRUD statement rendering.
//!
//! Escaping policy differs per operation and is part of the contract:
//!
//! | operation    | identifiers | values                        |
//! |--------------|-------------|-------------------------------|
//! | `insert`     | escaped     | escaped, quoted, `NULL` bare  |
//! | `select`     | escaped     | n/a (raw predicate fragments) |
//! | `update`     | as given    | **as given, unescaped**       |
//! | `update_all` | escaped     | escaped, quoted, `NULL` bare  |
//! | `delete`     | as given    | n/a (raw predicate)           |
//!
//! Bytes are always rendered as hex literals (`X'ff00'`).
//!
//! `update` interpolates values verbatim so callers can pass expressions such
//! as `hits + 1`; anything user-supplied must be sanitised before it gets
//! there.

use super::params::{SelectParams, Values};
use crate::traits::{Escape, Value};

fn is_blank(predicate: &str) -> bool {
    predicate.trim().is_empty()
}

/// Renders statements using a driver's escaping rules.
pub struct StatementBuilder<'a> {
    escaper: &'a dyn Escape,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(escaper: &'a dyn Escape) -> Self {
        Self { escaper }
    }

    fn quoted(&self, value: &Value) -> String {
        value.to_sql_literal(|s| self.escaper.escape(s))
    }

    /// Verbatim text for `update`; bytes still need the hex form to survive.
    fn raw(value: &Value) -> String {
        match value {
            Value::Bytes(_) => value.to_sql_literal(str::to_string),
            other => other.to_literal_string(),
        }
    }

    /// `INSERT INTO <table> (<cols>) VALUES (<vals>)`.
    ///
    /// Empty `values` renders empty lists; the backend will reject that.
    pub fn insert(&self, table: &str, values: &Values) -> String {
        let columns: Vec<String> = values.columns().map(|c| self.escaper.escape(c)).collect();
        let literals: Vec<String> = values.iter().map(|(_, v)| self.quoted(v)).collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.escaper.escape(table),
            columns.join(","),
            literals.join(",")
        )
    }

    /// `SELECT <cols|*> FROM <table> [WHERE] [GROUP BY] [ORDER BY] [LIMIT]`.
    pub fn select(&self, table: &str, params: &SelectParams) -> String {
        let columns = match &params.columns {
            Some(columns) if !columns.is_empty() => columns
                .iter()
                .map(|c| self.escaper.escape(c))
                .collect::<Vec<_>>()
                .join(","),
            _ => "*".to_string(),
        };

        let mut sql = format!("SELECT {} FROM {}", columns, self.escaper.escape(table));

        if let Some(predicate) = params.where_clause.as_deref().filter(|p| !is_blank(p)) {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }

        if let Some(group_by) = params.group_by.as_deref().filter(|g| !is_blank(g)) {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }

        if let Some(order_by) = params.order_by.as_deref().filter(|o| !is_blank(o)) {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }

        if let Some(limit) = params.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        sql
    }

    /// `UPDATE <table> SET col=value,... WHERE <predicate>`, values unescaped.
    ///
    /// Returns `None` when `predicate` is blank: whole-table updates go
    /// through `update_all`.
    pub fn update(&self, table: &str, values: &Values, predicate: &str) -> Option<String> {
        if is_blank(predicate) {
            return None;
        }

        let assignments: Vec<String> = values
            .iter()
            .map(|(column, value)| format!("{}={}", column, Self::raw(value)))
            .collect();

        Some(format!(
            "UPDATE {} SET {} WHERE {}",
            table,
            assignments.join(","),
            predicate
        ))
    }

    /// `UPDATE <table> SET col='value',...` on every row, values escaped.
    pub fn update_all(&self, table: &str, values: &Values) -> String {
        let assignments: Vec<String> = values
            .iter()
            .map(|(column, value)| format!("{}={}", self.escaper.escape(column), self.quoted(value)))
            .collect();

        format!("UPDATE {} SET {}", table, assignments.join(","))
    }

    /// `DELETE FROM <table> WHERE <predicate>`; `None` when `predicate` is blank.
    pub fn delete(&self, table: &str, predicate: &str) -> Option<String> {
        if is_blank(predicate) {
            return None;
        }
        Some(format!("DELETE FROM {} WHERE {}", table, predicate))
    }

    /// `DELETE FROM <table>`, every row.
    pub fn delete_all(&self, table: &str) -> String {
        format!("DELETE FROM {}", table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// MySQL-flavoured backslash escaping of quotes.
    struct Backslash;

    impl Escape for Backslash {
        fn escape(&self, value: &str) -> String {
            value.replace('\\', "\\\\").replace('\'', "\\'")
        }
    }

    fn builder() -> StatementBuilder<'static> {
        StatementBuilder::new(&Backslash)
    }

    #[test]
    fn test_insert_escapes_values() {
        let sql = builder().insert("users", &Values::new().set("name", "O'Brien"));
        assert_eq!(sql, "INSERT INTO users (name) VALUES ('O\\'Brien')");
    }

    #[test]
    fn test_insert_columns_and_values_line_up() {
        let values = Values::new()
            .set("name", "Ada")
            .set("age", 36)
            .set("nickname", Value::Null)
            .set("admin", true);
        let sql = builder().insert("people", &values);
        assert_eq!(
            sql,
            "INSERT INTO people (name,age,nickname,admin) VALUES ('Ada','36',NULL,'1')"
        );
    }

    #[test]
    fn test_bytes_become_hex_literals() {
        let values = Values::new().set("data", Value::Bytes(vec![0xff, 0x00, 0x80]));
        assert_eq!(
            builder().insert("blobs", &values),
            "INSERT INTO blobs (data) VALUES (X'ff0080')"
        );
        assert_eq!(
            builder().update("blobs", &values, "id=1").as_deref(),
            Some("UPDATE blobs SET data=X'ff0080' WHERE id=1")
        );
        assert_eq!(
            builder().update_all("blobs", &values),
            "UPDATE blobs SET data=X'ff0080'"
        );
    }

    #[test]
    fn test_insert_with_no_values() {
        assert_eq!(builder().insert("t", &Values::new()), "INSERT INTO t () VALUES ()");
    }

    #[test]
    fn test_select_defaults_to_star() {
        assert_eq!(builder().select("users", &SelectParams::new()), "SELECT * FROM users");
    }

    #[test]
    fn test_select_limit_only() {
        let sql = builder().select("users", &SelectParams::new().limit(10));
        assert_eq!(sql, "SELECT * FROM users LIMIT 10");
        assert!(!sql.contains("WHERE"));
        assert!(!sql.contains("GROUP BY"));
        assert!(!sql.contains("ORDER BY"));
        assert!(sql.ends_with("LIMIT 10"));
    }

    #[test]
    fn test_select_clause_order() {
        let params = SelectParams::new()
            .columns(["role", "COUNT(*)"])
            .limit(3)
            .order_by("role")
            .group_by("role")
            .filter("active = 1");
        assert_eq!(
            builder().select("users", &params),
            "SELECT role,COUNT(*) FROM users WHERE active = 1 GROUP BY role ORDER BY role LIMIT 3"
        );
    }

    #[test]
    fn test_select_ignores_blank_fragments() {
        let params = SelectParams::new().filter("  ").columns(Vec::<String>::new());
        assert_eq!(builder().select("t", &params), "SELECT * FROM t");
    }

    #[test]
    fn test_update_requires_predicate() {
        let values = Values::new().set("hits", "hits + 1");
        assert_eq!(builder().update("pages", &values, ""), None);
        assert_eq!(builder().update("pages", &values, "   "), None);
    }

    #[test]
    fn test_update_interpolates_values_verbatim() {
        let values = Values::new().set("hits", "hits + 1").set("title", "'Home'");
        assert_eq!(
            builder().update("pages", &values, "id=1").as_deref(),
            Some("UPDATE pages SET hits=hits + 1,title='Home' WHERE id=1")
        );
    }

    #[test]
    fn test_update_all_escapes_values() {
        let values = Values::new().set("motto", "it's fine").set("note", Value::Null);
        assert_eq!(
            builder().update_all("teams", &values),
            "UPDATE teams SET motto='it\\'s fine',note=NULL"
        );
    }

    #[test]
    fn test_delete_requires_predicate() {
        assert_eq!(builder().delete("sessions", ""), None);
        assert_eq!(
            builder().delete("sessions", "expires_at < NOW()").as_deref(),
            Some("DELETE FROM sessions WHERE expires_at < NOW()")
        );
    }

    #[test]
    fn test_delete_all() {
        assert_eq!(builder().delete_all("sessions"), "DELETE FROM sessions");
    }
}
