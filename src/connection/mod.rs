//! The connection facade.
//!
//! `DatabaseConnection` ties one driver to the shared schema registry. It
//! compiles DDL and CRUD statements, hands them to the driver, and records
//! failures in its `ConnectionState` instead of panicking.

mod state;

pub use state::{ConnectionState, StatementOutcome};

use std::sync::Arc;

use crate::drivers::ConnectionFactory;
use crate::error::{DatabaseError, DatabaseResult, SchemaError};
use crate::query::{SelectParams, StatementBuilder, Values};
use crate::schema::{SchemaRegistry, TableCompiler};
use crate::traits::{
    BoxedDriver, ConnectionConfig, DatabaseDriver, ModifiedResult, QueryExecutionResult,
    SelectResult,
};

/// One driver connection plus the schema it serves.
///
/// Methods take `&mut self`: a facade runs one statement at a time. Use one
/// facade per concurrent caller; they can all share the same registry.
pub struct DatabaseConnection {
    driver: BoxedDriver,
    registry: Arc<SchemaRegistry>,
    state: ConnectionState,
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("driver", &self.driver.display_name())
            .field("tables", &self.registry.len())
            .field("state", &self.state)
            .finish()
    }
}

impl DatabaseConnection {
    /// Wrap a driver that is already connected.
    pub fn new(driver: BoxedDriver, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            driver,
            registry,
            state: ConnectionState::connected(),
        }
    }

    /// Create the driver for `config`, connect it and wrap it.
    pub async fn open(
        config: ConnectionConfig,
        registry: Arc<SchemaRegistry>,
    ) -> DatabaseResult<Self> {
        let mut driver = ConnectionFactory::create(config).map_err(DatabaseError::Connect)?;
        driver.connect().await.map_err(|e| {
            tracing::error!("Could not connect to {}: {}", driver.display_name(), e);
            DatabaseError::Connect(e)
        })?;

        Ok(Self::new(driver, registry))
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    pub fn has_error(&self) -> bool {
        self.state.error
    }

    /// Diagnostic for the most recent failure, empty if none.
    pub fn message(&self) -> &str {
        &self.state.message
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn driver(&self) -> &dyn DatabaseDriver {
        self.driver.as_ref()
    }

    /// Issue `CREATE TABLE IF NOT EXISTS` for a registered table.
    ///
    /// Returns the DDL that was executed. Safe to call repeatedly; an
    /// existing table is left untouched even if its definition differs.
    pub async fn verify_table(&mut self, table_name: &str) -> DatabaseResult<String> {
        self.ensure_connected()?;

        let compiled = TableCompiler::new(&self.registry, &self.driver).compile(table_name);
        let ddl = compiled.map_err(|err| self.schema_failure(err))?;

        self.run(&ddl, format!("Could not verify table {}", table_name))
            .await?;
        Ok(ddl)
    }

    /// Verify every registered table, in registration order, as one batch.
    ///
    /// Nothing is sent if any table fails to compile.
    pub async fn verify_tables(&mut self) -> DatabaseResult<Vec<String>> {
        self.ensure_connected()?;

        let compiled = TableCompiler::new(&self.registry, &self.driver).compile_all();
        let statements = compiled.map_err(|err| self.schema_failure(err))?;

        let results = self.run_batch(&statements).await?;
        if let Some(QueryExecutionResult::Error(err)) = results.last() {
            let index = results.len() - 1;
            let table = self
                .registry
                .table_names()
                .nth(index)
                .unwrap_or_default()
                .to_string();
            return Err(self.rejected(
                format!("Could not verify table {}", table),
                &statements[index],
                &err.message,
            ));
        }

        Ok(statements)
    }

    /// Insert one row. Values are escaped through the driver.
    pub async fn insert(&mut self, table: &str, values: &Values) -> DatabaseResult<ModifiedResult> {
        self.ensure_connected()?;

        let sql = StatementBuilder::new(&self.driver).insert(table, values);
        let result = self
            .run(&sql, format!("Could not insert into table {}", table))
            .await?;
        Ok(into_modified(result))
    }

    /// Id generated by the most recent insert on this connection.
    pub async fn insert_id(&self) -> Option<u64> {
        self.driver.last_insert_id().await
    }

    /// Rows returned or affected by the most recent statement.
    pub async fn num_rows(&self) -> u64 {
        self.driver.row_count().await
    }

    pub async fn select(
        &mut self,
        table: &str,
        params: &SelectParams,
    ) -> DatabaseResult<SelectResult> {
        self.ensure_connected()?;

        let sql = StatementBuilder::new(&self.driver).select(table, params);
        let result = self
            .run(&sql, format!("Could not select from table {}", table))
            .await?;

        Ok(match result {
            QueryExecutionResult::Select(select) => select,
            QueryExecutionResult::Modified(modified) => {
                SelectResult::new(Vec::new(), Vec::new(), modified.execution_time_ms, sql)
            }
            QueryExecutionResult::Error(err) => {
                SelectResult::new(Vec::new(), Vec::new(), err.execution_time_ms, sql)
            }
        })
    }

    /// Update rows matching `predicate`.
    ///
    /// Values are interpolated without escaping so expressions such as
    /// `hits + 1` work; sanitise anything user-supplied first. A blank
    /// predicate sends nothing and returns `StatementOutcome::Skipped`.
    pub async fn update(
        &mut self,
        table: &str,
        values: &Values,
        predicate: &str,
    ) -> DatabaseResult<StatementOutcome> {
        self.ensure_connected()?;

        let Some(sql) = StatementBuilder::new(&self.driver).update(table, values, predicate) else {
            tracing::warn!(
                "Refusing to update {} without a predicate, use update_all instead",
                table
            );
            return Ok(StatementOutcome::Skipped);
        };

        let result = self
            .run(&sql, format!("Could not update table {}", table))
            .await?;
        Ok(StatementOutcome::Executed(into_modified(result)))
    }

    /// Update every row. Values are escaped through the driver.
    pub async fn update_all(
        &mut self,
        table: &str,
        values: &Values,
    ) -> DatabaseResult<ModifiedResult> {
        self.ensure_connected()?;

        let sql = StatementBuilder::new(&self.driver).update_all(table, values);
        let result = self
            .run(&sql, format!("Could not update table {}", table))
            .await?;
        Ok(into_modified(result))
    }

    /// Delete rows matching `predicate`; a blank predicate is skipped.
    pub async fn delete(
        &mut self,
        table: &str,
        predicate: &str,
    ) -> DatabaseResult<StatementOutcome> {
        self.ensure_connected()?;

        let Some(sql) = StatementBuilder::new(&self.driver).delete(table, predicate) else {
            tracing::warn!(
                "Refusing to delete from {} without a predicate, use delete_all instead",
                table
            );
            return Ok(StatementOutcome::Skipped);
        };

        let result = self
            .run(&sql, format!("Could not delete from table {}", table))
            .await?;
        Ok(StatementOutcome::Executed(into_modified(result)))
    }

    pub async fn delete_all(&mut self, table: &str) -> DatabaseResult<ModifiedResult> {
        self.ensure_connected()?;

        let sql = StatementBuilder::new(&self.driver).delete_all(table);
        let result = self
            .run(&sql, format!("Could not delete from table {}", table))
            .await?;
        Ok(into_modified(result))
    }

    /// Run raw statements in order, stopping at the first rejection.
    pub async fn execute_batch(
        &mut self,
        statements: &[String],
    ) -> DatabaseResult<Vec<QueryExecutionResult>> {
        self.ensure_connected()?;

        let results = self.run_batch(statements).await?;
        if let Some(QueryExecutionResult::Error(err)) = results.last() {
            let index = results.len() - 1;
            return Err(self.rejected(
                format!("Could not execute statement {} of {}", index + 1, statements.len()),
                &statements[index],
                &err.message,
            ));
        }

        Ok(results)
    }

    /// Close the driver connection.
    ///
    /// The error flag is set to `is_error`; `message`, when given, replaces
    /// the stored diagnostic. Later statements fail with `NotConnected`.
    pub async fn disconnect(&mut self, is_error: bool, message: Option<&str>) {
        self.state.error = is_error;
        if let Some(message) = message {
            self.state.message = message.to_string();
        }

        if self.state.connected {
            if let Err(e) = self.driver.disconnect().await {
                tracing::warn!("Failed to disconnect from {}: {}", self.driver.display_name(), e);
            }
        }
        self.state.connected = false;
    }

    fn ensure_connected(&self) -> DatabaseResult<()> {
        if self.state.connected {
            Ok(())
        } else {
            Err(DatabaseError::NotConnected)
        }
    }

    fn schema_failure(&mut self, err: SchemaError) -> DatabaseError {
        tracing::error!("{}", err);
        self.state.fail(err.to_string());
        err.into()
    }

    fn rejected(&mut self, context: String, query: &str, message: &str) -> DatabaseError {
        let err = DatabaseError::DriverRejected {
            context,
            query: query.to_string(),
            message: message.to_string(),
        };
        tracing::error!("{}", err);
        self.state.fail(err.to_string());
        err
    }

    async fn run(&mut self, sql: &str, context: String) -> DatabaseResult<QueryExecutionResult> {
        tracing::debug!("{}", sql);

        match self.driver.execute(sql).await {
            Ok(QueryExecutionResult::Error(err)) => Err(self.rejected(context, sql, &err.message)),
            Ok(result) => Ok(result),
            Err(e) => {
                self.state.fail(format!("{}. Error: {}", context, e));
                Err(DatabaseError::Driver(e))
            }
        }
    }

    async fn run_batch(&mut self, statements: &[String]) -> DatabaseResult<Vec<QueryExecutionResult>> {
        for sql in statements {
            tracing::debug!("{}", sql);
        }

        match self.driver.execute_batch(statements).await {
            Ok(results) => Ok(results),
            Err(e) => {
                self.state.fail(format!("Batch failed. Error: {}", e));
                Err(DatabaseError::Driver(e))
            }
        }
    }
}

fn into_modified(result: QueryExecutionResult) -> ModifiedResult {
    match result {
        QueryExecutionResult::Modified(modified) => modified,
        QueryExecutionResult::Select(select) => {
            ModifiedResult::new(select.row_count as u64, select.execution_time_ms)
        }
        QueryExecutionResult::Error(err) => ModifiedResult::new(0, err.execution_time_ms),
    }
}
