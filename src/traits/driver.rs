//! Core driver traits.
//!
//! This module defines the `DatabaseDriver` trait every backend implements and
//! the `Escape` capability the schema compiler and statement builder rely on.
//! The core never escapes strings itself; it always asks the driver.

use anyhow::Result;
use async_trait::async_trait;

use super::row::{ColumnInfo, Row};
use super::types::{ConnectionConfig, ConnectionParams, DatabaseType};

/// Result of executing a statement
#[derive(Debug, Clone)]
pub enum QueryExecutionResult {
    /// SELECT result with rows
    Select(SelectResult),
    /// Statement result without rows (DDL, INSERT, UPDATE, DELETE)
    Modified(ModifiedResult),
    /// The backend rejected the statement
    Error(ErrorResult),
}

impl QueryExecutionResult {
    /// Whether the backend rejected the statement
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Result of a SELECT query
#[derive(Debug, Clone)]
pub struct SelectResult {
    /// Column metadata
    pub columns: Vec<ColumnInfo>,
    /// Result rows
    pub rows: Vec<Row>,
    /// Total row count
    pub row_count: usize,
    /// Execution time in milliseconds
    pub execution_time_ms: u128,
    /// The query that was executed
    pub original_query: String,
}

impl SelectResult {
    /// Create a new select result
    pub fn new(
        columns: Vec<ColumnInfo>,
        rows: Vec<Row>,
        execution_time_ms: u128,
        original_query: String,
    ) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
            execution_time_ms,
            original_query,
        }
    }
}

/// Result of a statement that returns no rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiedResult {
    /// Number of rows affected
    pub rows_affected: u64,
    /// Id generated by the statement, when the backend reports one
    pub last_insert_id: Option<u64>,
    /// Execution time in milliseconds
    pub execution_time_ms: u128,
}

impl ModifiedResult {
    /// Create a new modified result
    pub fn new(rows_affected: u64, execution_time_ms: u128) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
            execution_time_ms,
        }
    }

    /// Attach the generated id
    pub fn with_last_insert_id(mut self, id: u64) -> Self {
        self.last_insert_id = Some(id);
        self
    }
}

/// Result when the backend rejects a statement
#[derive(Debug, Clone)]
pub struct ErrorResult {
    /// Native error text from the backend
    pub message: String,
    /// Execution time in milliseconds
    pub execution_time_ms: u128,
}

impl ErrorResult {
    /// Create a new error result
    pub fn new(message: String, execution_time_ms: u128) -> Self {
        Self {
            message,
            execution_time_ms,
        }
    }
}

/// Bookkeeping a driver keeps about the last statement it ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Id generated by the last successful INSERT
    pub last_insert_id: Option<u64>,
    /// Rows returned (SELECT) or affected (everything else) by the last statement
    pub row_count: u64,
}

impl ExecutionStats {
    /// Fold a statement result into the stats. Rejected statements leave them untouched.
    pub fn record(&mut self, result: &QueryExecutionResult) {
        match result {
            QueryExecutionResult::Select(select) => {
                self.row_count = select.row_count as u64;
            }
            QueryExecutionResult::Modified(modified) => {
                self.row_count = modified.rows_affected;
                if modified.last_insert_id.is_some() {
                    self.last_insert_id = modified.last_insert_id;
                }
            }
            QueryExecutionResult::Error(_) => {}
        }
    }
}

/// Escapes a string for embedding in an identifier or literal position.
///
/// Implementations must not add surrounding quotes; callers decide where the
/// escaped text goes.
pub trait Escape {
    fn escape(&self, value: &str) -> String;
}

impl<T: Escape + ?Sized> Escape for Box<T> {
    fn escape(&self, value: &str) -> String {
        (**self).escape(value)
    }
}

/// Core trait for all driver backends.
///
/// A driver owns one logical connection. It executes whatever SQL text it is
/// given and reports backend failures as `QueryExecutionResult::Error` rather
/// than as `Err`, which is reserved for "could not even try" conditions such
/// as a missing connection.
///
/// # Example
///
/// ```ignore
/// use tablesmith::traits::DatabaseDriver;
///
/// async fn example(driver: &dyn DatabaseDriver) -> anyhow::Result<()> {
///     if driver.is_connected().await {
///         let result = driver.execute("SELECT 1").await?;
///         // Process result...
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait DatabaseDriver: Escape + Send + Sync {
    /// Get the backend type for this driver
    fn database_type(&self) -> DatabaseType;

    /// Get the connection configuration
    fn connection_config(&self) -> &ConnectionConfig;

    /// Establish a connection to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established, such as:
    /// - Invalid credentials
    /// - Network errors
    /// - Server not available
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from the database, releasing any resources.
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if the connection is currently active.
    async fn is_connected(&self) -> bool;

    /// Execute one SQL statement.
    ///
    /// Used for both DDL and DML. SELECT-type statements yield
    /// `QueryExecutionResult::Select`, everything else `Modified`.
    async fn execute(&self, sql: &str) -> Result<QueryExecutionResult>;

    /// Execute an ordered sequence of statements, one after another.
    ///
    /// Stops at the first statement the backend rejects; the returned vector
    /// then ends with that `Error` result.
    async fn execute_batch(&self, statements: &[String]) -> Result<Vec<QueryExecutionResult>> {
        let mut results = Vec::with_capacity(statements.len());
        for sql in statements {
            let result = self.execute(sql).await?;
            let rejected = result.is_error();
            results.push(result);
            if rejected {
                break;
            }
        }
        Ok(results)
    }

    /// Id generated by the most recent successful INSERT.
    async fn last_insert_id(&self) -> Option<u64>;

    /// Rows returned or affected by the most recent statement.
    async fn row_count(&self) -> u64;

    /// Get a display name for the current connection.
    ///
    /// "user@host:port/database" for server connections, the file path for
    /// file-based connections.
    fn display_name(&self) -> String {
        let config = self.connection_config();
        match &config.params {
            ConnectionParams::Server {
                hostname,
                port,
                username,
                database,
                ..
            } => {
                format!("{}@{}:{}/{}", username, hostname, port, database)
            }
            ConnectionParams::File { path, .. } => path.display().to_string(),
            ConnectionParams::InMemory => ":memory:".to_string(),
        }
    }
}

/// A boxed driver trait object.
pub type BoxedDriver = Box<dyn DatabaseDriver>;
