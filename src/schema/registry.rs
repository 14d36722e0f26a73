//! Table and column descriptors, and the registry that holds them.
//!
//! The registry is loaded once (usually from a JSON document) and then only
//! read. Share it between connections with `Arc<SchemaRegistry>`.
//!
//! The JSON layout maps table names to table objects. A table object maps
//! column names to column objects and may carry one `"primary_key"` entry
//! naming a column:
//!
//! ```json
//! {
//!   "users": {
//!     "id": { "type": "INT", "auto_increment": true },
//!     "primary_key": "id",
//!     "email": { "type": "VARCHAR(255)", "unique": true, "nullable": false }
//!   }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};

const PRIMARY_KEY_ENTRY: &str = "primary_key";

fn default_true() -> bool {
    true
}

/// Foreign key exactly as written in the configuration.
///
/// Nothing is checked at load time; `schema::foreign_key::validate` does that
/// when the owning table is compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub on_update: Option<String>,
}

impl ForeignKeyDescriptor {
    /// Reference `table(column)` with no referential actions
    pub fn references(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: Some(column.into()),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }

    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.on_update = Some(action.into());
        self
    }
}

/// Column default as written in the configuration.
///
/// JSON booleans and numbers map to their own variants, strings to `Text`
/// (rendered as an escaped, quoted literal) and `{"expr": "..."}` to
/// `Expression` (rendered verbatim, e.g. `CURRENT_TIMESTAMP`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Expression { expr: String },
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Engine-native type literal, e.g. `VARCHAR(255)`
    #[serde(rename = "type", default)]
    pub column_type: Option<String>,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub default: Option<DefaultValue>,
    #[serde(default)]
    pub foreign_key: Option<ForeignKeyDescriptor>,
}

impl Default for ColumnDescriptor {
    fn default() -> Self {
        Self {
            column_type: None,
            nullable: true,
            unique: false,
            auto_increment: false,
            default: None,
            foreign_key: None,
        }
    }
}

impl ColumnDescriptor {
    /// Create a nullable column of the given type
    pub fn new(column_type: impl Into<String>) -> Self {
        Self {
            column_type: Some(column_type.into()),
            ..Self::default()
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyDescriptor) -> Self {
        self.foreign_key = Some(foreign_key);
        self
    }
}

/// Ordered columns plus an optional primary key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDescriptor {
    columns: Vec<(String, ColumnDescriptor)>,
    primary_key: Option<String>,
}

impl TableDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, replacing any column already registered under `name`
    pub fn column(mut self, name: impl Into<String>, descriptor: ColumnDescriptor) -> Self {
        let name = name.into();
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = descriptor,
            None => self.columns.push((name, descriptor)),
        }
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Columns in registration order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnDescriptor)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, column)| column)
    }

    pub fn primary_key_column(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Check that the primary key, if any, names one of the columns.
    pub fn validate(&self, table_name: &str) -> SchemaResult<()> {
        match &self.primary_key {
            Some(pk) if self.get_column(pk).is_none() => Err(SchemaError::UnknownPrimaryKey {
                table: table_name.to_string(),
                column: pk.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Parse one table object. The `primary_key` entry is pulled out; every
    /// other entry must be a column object.
    pub fn from_json(table_name: &str, value: serde_json::Value) -> SchemaResult<Self> {
        let serde_json::Value::Object(entries) = value else {
            return Err(SchemaError::InvalidConfig(format!(
                "table {} must be an object",
                table_name
            )));
        };

        let mut table = Self::new();
        for (key, entry) in entries {
            if key == PRIMARY_KEY_ENTRY {
                let serde_json::Value::String(pk) = entry else {
                    return Err(SchemaError::InvalidConfig(format!(
                        "primary_key of table {} must be a column name",
                        table_name
                    )));
                };
                table.primary_key = Some(pk);
                continue;
            }

            let column: ColumnDescriptor = serde_json::from_value(entry).map_err(|e| {
                SchemaError::InvalidConfig(format!("column {}.{}: {}", table_name, key, e))
            })?;
            table = table.column(key, column);
        }

        table.validate(table_name)?;
        Ok(table)
    }
}

/// Table name -> descriptor, in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    tables: Vec<(String, TableDescriptor)>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table, replacing any table already registered under `name`
    pub fn with_table(mut self, name: impl Into<String>, table: TableDescriptor) -> SchemaResult<Self> {
        let name = name.into();
        table.validate(&name)?;
        match self.tables.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = table,
            None => self.tables.push((name, table)),
        }
        Ok(self)
    }

    /// Build a registry from an already parsed JSON document
    pub fn from_value(value: serde_json::Value) -> SchemaResult<Self> {
        let serde_json::Value::Object(tables) = value else {
            return Err(SchemaError::InvalidConfig(
                "schema root must be an object of tables".to_string(),
            ));
        };

        let mut registry = Self::new();
        for (name, table) in tables {
            let table = TableDescriptor::from_json(&name, table)?;
            registry.tables.push((name, table));
        }

        tracing::debug!("Loaded schema with {} table(s)", registry.len());
        Ok(registry)
    }

    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| SchemaError::InvalidConfig(e.to_string()))?;
        Self::from_value(value)
    }

    /// Load a schema document from disk
    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SchemaError::InvalidConfig(format!("could not read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Look up a table, failing with `UnknownTable`
    pub fn get(&self, name: &str) -> SchemaResult<&TableDescriptor> {
        self.tables
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, table)| table)
            .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.iter().any(|(existing, _)| existing == name)
    }

    /// Table names in registration order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCHEMA: &str = r#"{
        "users": {
            "id": { "type": "INT", "auto_increment": true },
            "primary_key": "id",
            "email": { "type": "VARCHAR(255)", "unique": true, "nullable": false },
            "created_at": { "type": "DATETIME", "default": { "expr": "CURRENT_TIMESTAMP" } }
        },
        "posts": {
            "id": { "type": "INT" },
            "author_id": {
                "type": "INT",
                "foreign_key": { "table": "users", "column": "id", "on_delete": "CASCADE" }
            },
            "score": { "type": "DOUBLE", "default": 1.5 },
            "draft": { "type": "TINYINT(1)", "default": true }
        }
    }"#;

    #[test]
    fn test_registry_preserves_table_and_column_order() {
        let registry = SchemaRegistry::from_json_str(SCHEMA).unwrap();

        assert_eq!(registry.table_names().collect::<Vec<_>>(), vec!["users", "posts"]);

        let users = registry.get("users").unwrap();
        let names: Vec<&str> = users.columns().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["id", "email", "created_at"]);
        assert_eq!(users.primary_key_column(), Some("id"));
    }

    #[test]
    fn test_column_defaults_resolved_at_load() {
        let registry = SchemaRegistry::from_json_str(SCHEMA).unwrap();
        let users = registry.get("users").unwrap();

        let id = users.get_column("id").unwrap();
        assert!(id.nullable);
        assert!(!id.unique);
        assert!(id.auto_increment);
        assert_eq!(id.default, None);

        let created_at = users.get_column("created_at").unwrap();
        assert_eq!(
            created_at.default,
            Some(DefaultValue::Expression {
                expr: "CURRENT_TIMESTAMP".to_string()
            })
        );
    }

    #[test]
    fn test_default_value_variants() {
        let registry = SchemaRegistry::from_json_str(SCHEMA).unwrap();
        let posts = registry.get("posts").unwrap();

        assert_eq!(
            posts.get_column("score").unwrap().default,
            Some(DefaultValue::Float(1.5))
        );
        assert_eq!(
            posts.get_column("draft").unwrap().default,
            Some(DefaultValue::Bool(true))
        );

        let fk = posts.get_column("author_id").unwrap().foreign_key.clone().unwrap();
        assert_eq!(fk.table.as_deref(), Some("users"));
        assert_eq!(fk.on_delete.as_deref(), Some("CASCADE"));
        assert_eq!(fk.on_update, None);
    }

    #[test]
    fn test_missing_type_is_not_a_load_error() {
        let registry = SchemaRegistry::from_json_str(r#"{"t": {"a": {"nullable": false}}}"#).unwrap();
        let column = registry.get("t").unwrap().get_column("a").unwrap();
        assert_eq!(column.column_type, None);
        assert!(!column.nullable);
    }

    #[test]
    fn test_unknown_table() {
        let registry = SchemaRegistry::from_json_str(SCHEMA).unwrap();
        assert_eq!(
            registry.get("comments").unwrap_err(),
            SchemaError::UnknownTable("comments".to_string())
        );
        assert!(!registry.contains("comments"));
    }

    #[test]
    fn test_primary_key_must_name_a_column() {
        let err = SchemaRegistry::from_json_str(
            r#"{"t": {"a": {"type": "INT"}, "primary_key": "b"}}"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownPrimaryKey {
                table: "t".to_string(),
                column: "b".to_string()
            }
        );

        let err = SchemaRegistry::new()
            .with_table("t", TableDescriptor::new().primary_key("missing"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownPrimaryKey { .. }));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            SchemaRegistry::from_json_str("[]"),
            Err(SchemaError::InvalidConfig(_))
        ));
        assert!(matches!(
            SchemaRegistry::from_json_str(r#"{"t": {"primary_key": 3}}"#),
            Err(SchemaError::InvalidConfig(_))
        ));
        assert!(matches!(
            SchemaRegistry::from_json_str(r#"{"t": {"a": {"type": "INT", "nullable": "yes"}}}"#),
            Err(SchemaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_builder_replaces_duplicate_columns() {
        let table = TableDescriptor::new()
            .column("a", ColumnDescriptor::new("INT"))
            .column("b", ColumnDescriptor::new("TEXT"))
            .column("a", ColumnDescriptor::new("BIGINT"));

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get_column("a").unwrap().column_type.as_deref(),
            Some("BIGINT")
        );
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCHEMA.as_bytes()).unwrap();

        let registry = SchemaRegistry::from_path(file.path()).unwrap();
        assert_eq!(registry.len(), 2);

        let missing = SchemaRegistry::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(SchemaError::InvalidConfig(_))));
    }
}
