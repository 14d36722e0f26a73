//! Foreign key validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::registry::ForeignKeyDescriptor;
use crate::error::{SchemaError, SchemaResult};

const VALID_ACTIONS: &str = "cascade, restrict, no action, set default, set null";

/// What the database does to referencing rows when the referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    NoAction,
    SetDefault,
    SetNull,
}

impl ReferentialAction {
    /// SQL spelling of the action
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
            Self::SetDefault => "SET DEFAULT",
            Self::SetNull => "SET NULL",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for ReferentialAction {
    type Err = ();

    /// Case-insensitive; `no action` and `no_action` are both accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', " ").as_str() {
            "cascade" => Ok(Self::Cascade),
            "restrict" => Ok(Self::Restrict),
            "no action" => Ok(Self::NoAction),
            "set default" => Ok(Self::SetDefault),
            "set null" => Ok(Self::SetNull),
            _ => Err(()),
        }
    }
}

/// A validated foreign key, tagged with the local column that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub local_column: String,
    pub table: String,
    pub column: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

fn required(value: &Option<String>, local_column: &str, field: &'static str) -> SchemaResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(SchemaError::MissingField {
            column: local_column.to_string(),
            field,
        }),
    }
}

fn action(
    value: &Option<String>,
    local_column: &str,
    field: &'static str,
) -> SchemaResult<Option<ReferentialAction>> {
    value
        .as_deref()
        .map(|raw| {
            raw.trim()
                .parse::<ReferentialAction>()
                .map_err(|_| SchemaError::InvalidAction {
                    column: local_column.to_string(),
                    field,
                    value: raw.to_string(),
                    expected: VALID_ACTIONS,
                })
        })
        .transpose()
}

/// Validate the foreign key declared on `local_column`.
///
/// Checks run in a fixed order: `table`, `column`, `on_delete`, `on_update`.
pub fn validate(local_column: &str, descriptor: &ForeignKeyDescriptor) -> SchemaResult<ForeignKey> {
    let table = required(&descriptor.table, local_column, "table")?;
    let column = required(&descriptor.column, local_column, "column")?;
    let on_delete = action(&descriptor.on_delete, local_column, "on_delete")?;
    let on_update = action(&descriptor.on_update, local_column, "on_update")?;

    Ok(ForeignKey {
        local_column: local_column.to_string(),
        table,
        column,
        on_delete,
        on_update,
    })
}
