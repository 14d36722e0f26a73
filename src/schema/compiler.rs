//! `CREATE TABLE IF NOT EXISTS` compilation.
//!
//! Compilation is pure: it turns a registered table into SQL text or a
//! `SchemaError`. Issuing the statement is the connection's job.

use super::column::render_column;
use super::foreign_key::{self, ForeignKey};
use super::registry::SchemaRegistry;
use crate::error::{SchemaError, SchemaResult};
use crate::traits::Escape;

/// Compiles registered tables into DDL using a driver's escaping rules.
pub struct TableCompiler<'a> {
    registry: &'a SchemaRegistry,
    escaper: &'a dyn Escape,
}

impl<'a> TableCompiler<'a> {
    pub fn new(registry: &'a SchemaRegistry, escaper: &'a dyn Escape) -> Self {
        Self { registry, escaper }
    }

    /// Compile one table.
    ///
    /// Columns render in registration order. A column without a type, or a
    /// foreign key that fails validation, aborts compilation with the
    /// offending column named in the error.
    pub fn compile(&self, table_name: &str) -> SchemaResult<String> {
        let table = self.registry.get(table_name)?;
        table.validate(table_name)?;
        let primary_key = table.primary_key_column();

        let mut clauses = Vec::with_capacity(table.len() + 1);
        let mut foreign_keys: Vec<ForeignKey> = Vec::new();

        for (name, column) in table.columns() {
            let column_type = column
                .column_type
                .as_deref()
                .ok_or_else(|| SchemaError::MissingType(name.to_string()))?;

            clauses.push(render_column(
                self.escaper,
                name,
                column_type,
                column,
                primary_key == Some(name),
            ));

            if let Some(descriptor) = &column.foreign_key {
                foreign_keys.push(foreign_key::validate(name, descriptor)?);
            }
        }

        if let Some(pk) = primary_key {
            let pk = self.escaper.escape(pk);
            clauses.push(format!("CONSTRAINT {} PRIMARY KEY (`{}`)", pk, pk));
        }

        for fk in &foreign_keys {
            clauses.push(self.foreign_key_clause(table_name, fk));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS `{}` ({});",
            self.escaper.escape(table_name),
            clauses.join(", ")
        ))
    }

    /// Compile every registered table, in registration order.
    ///
    /// Register referenced tables before the tables pointing at them so the
    /// batch can run top to bottom.
    pub fn compile_all(&self) -> SchemaResult<Vec<String>> {
        self.registry
            .table_names()
            .map(|name| self.compile(name))
            .collect()
    }

    fn foreign_key_clause(&self, table_name: &str, fk: &ForeignKey) -> String {
        let local = self.escaper.escape(&fk.local_column);
        let mut clause = format!(
            "CONSTRAINT fk_{}_{} FOREIGN KEY({}) REFERENCES {}({})",
            self.escaper.escape(table_name),
            local,
            local,
            self.escaper.escape(&fk.table),
            self.escaper.escape(&fk.column),
        );

        if let Some(action) = fk.on_update {
            clause.push_str(" ON UPDATE ");
            clause.push_str(action.as_sql());
        }

        if let Some(action) = fk.on_delete {
            clause.push_str(" ON DELETE ");
            clause.push_str(action.as_sql());
        }

        clause
    }
}
