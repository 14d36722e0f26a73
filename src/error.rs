//! Error types for schema compilation and statement execution

use thiserror::Error;

/// Schema validation error.
///
/// Every variant is detected before any SQL reaches a driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// No descriptor is registered under this table name
    #[error("Could not find configuration for table {0}")]
    UnknownTable(String),

    /// A column descriptor has no `type`
    #[error("Could not find type for column: {0}")]
    MissingType(String),

    /// A foreign key lacks `table` or `column`
    #[error("Foreign key on column {column} has no `{field}` key")]
    MissingField { column: String, field: &'static str },

    /// A referential action is not one of the accepted literals
    #[error("Error with column {column}: {field} must be one of {expected}, got `{value}`")]
    InvalidAction {
        column: String,
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// The primary key names a column the table does not have
    #[error("Primary key `{column}` of table {table} is not a column")]
    UnknownPrimaryKey { table: String, column: String },

    /// The schema document itself is malformed
    #[error("Invalid schema configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Error returned by the connection facade.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Schema validation failed; the driver was not contacted
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The backend executed the statement and rejected it
    #[error("{context}. Error: {message}. Query: {query}")]
    DriverRejected {
        context: String,
        query: String,
        message: String,
    },

    /// The facade has been disconnected
    #[error("Database not connected")]
    NotConnected,

    /// The driver could not connect
    #[error("Could not connect to database server: {0}")]
    Connect(#[source] anyhow::Error),

    /// The driver failed before the statement reached the backend
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Whether this error was produced by schema validation
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Schema(_))
    }
}

/// Result type for facade operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;
