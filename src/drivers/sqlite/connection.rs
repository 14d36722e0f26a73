//! SQLite driver implementation.
//!
//! This module implements the `DatabaseDriver` trait for SQLite
//! using SQLx's SqlitePool.

use anyhow::{Result, anyhow};
use async_lock::RwLock;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::time::{Duration, Instant};

use super::types::{SqliteValueConverter, escape_string};
use crate::traits::{
    BoxedDriver, ConnectionConfig, ConnectionParams, DatabaseDriver, DatabaseType, ErrorResult,
    Escape, ExecutionStats, ModifiedResult, QueryExecutionResult, Row, SelectResult,
};

/// SQLite driver.
///
/// Supports both file-based and in-memory databases. An in-memory database
/// lives as long as its single pooled connection, so the pool never grows
/// past one connection for it.
pub struct SqliteDriver {
    config: ConnectionConfig,
    pool: RwLock<Option<SqlitePool>>,
    stats: RwLock<ExecutionStats>,
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("config", &self.config)
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}

impl SqliteDriver {
    /// Create a new SQLite driver from configuration.
    ///
    /// This does not connect immediately - call `connect()` to establish the connection.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
            stats: RwLock::new(ExecutionStats::default()),
        }
    }

    /// Create a boxed driver (for factory use).
    pub fn boxed(config: ConnectionConfig) -> BoxedDriver {
        Box::new(Self::new(config))
    }

    fn build_connect_options(&self) -> Result<SqliteConnectOptions> {
        match &self.config.params {
            ConnectionParams::File {
                path, read_only, ..
            } => {
                let mut options = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(!read_only)
                    .foreign_keys(true);

                if *read_only {
                    options = options.read_only(true);
                } else {
                    options = options.journal_mode(SqliteJournalMode::Wal);
                }

                Ok(options)
            }
            ConnectionParams::InMemory => {
                Ok(SqliteConnectOptions::from_str(":memory:")?.foreign_keys(true))
            }
            ConnectionParams::Server { .. } => Err(anyhow!(
                "SQLite does not support server-based connections. Use File or InMemory params."
            )),
        }
    }

    fn max_connections(&self) -> u32 {
        match self.config.params {
            ConnectionParams::InMemory => 1,
            _ => 5,
        }
    }

    async fn get_pool(&self) -> Result<SqlitePool> {
        let guard = self.pool.read().await;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow!("Database not connected"))
    }

    fn is_select_query(sql: &str) -> bool {
        let lower = sql.to_lowercase();
        let trimmed = lower.trim_start();
        trimmed.starts_with("select")
            || trimmed.starts_with("with")
            || trimmed.starts_with("pragma")
    }

    fn is_insert_query(sql: &str) -> bool {
        let lower = sql.to_lowercase();
        let trimmed = lower.trim_start();
        trimmed.starts_with("insert") || trimmed.starts_with("replace")
    }

    async fn execute_select(&self, sql: &str, pool: &SqlitePool) -> QueryExecutionResult {
        let start_time = Instant::now();

        match sqlx::query(sql).fetch_all(pool).await {
            Ok(sqlite_rows) => {
                let execution_time_ms = start_time.elapsed().as_millis();

                let columns = sqlite_rows
                    .first()
                    .map(SqliteValueConverter::build_column_info)
                    .unwrap_or_default();
                let rows: Vec<Row> = sqlite_rows
                    .iter()
                    .map(SqliteValueConverter::convert_row)
                    .collect();

                QueryExecutionResult::Select(SelectResult::new(
                    columns,
                    rows,
                    execution_time_ms,
                    sql.to_string(),
                ))
            }
            Err(e) => QueryExecutionResult::Error(ErrorResult::new(
                e.to_string(),
                start_time.elapsed().as_millis(),
            )),
        }
    }

    async fn execute_modification(&self, sql: &str, pool: &SqlitePool) -> QueryExecutionResult {
        let start_time = Instant::now();

        match sqlx::query(sql).execute(pool).await {
            Ok(result) => {
                let mut modified =
                    ModifiedResult::new(result.rows_affected(), start_time.elapsed().as_millis());
                // last_insert_rowid is sticky across statements; only trust it after an insert
                if Self::is_insert_query(sql) && result.last_insert_rowid() > 0 {
                    modified = modified.with_last_insert_id(result.last_insert_rowid() as u64);
                }
                QueryExecutionResult::Modified(modified)
            }
            Err(e) => QueryExecutionResult::Error(ErrorResult::new(
                e.to_string(),
                start_time.elapsed().as_millis(),
            )),
        }
    }
}

impl Escape for SqliteDriver {
    fn escape(&self, value: &str) -> String {
        escape_string(value)
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&mut self) -> Result<()> {
        let options = self.build_connect_options()?;

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(self.max_connections())
            .acquire_timeout(Duration::from_secs(5));

        if matches!(self.config.params, ConnectionParams::InMemory) {
            // dropping the last connection drops the database
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;

        let mut guard = self.pool.write().await;
        *guard = Some(pool);
        tracing::debug!("Connected to {}", self.display_name());

        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut guard = self.pool.write().await;
        if let Some(pool) = guard.take() {
            pool.close().await;
            Ok(())
        } else {
            Err(anyhow!("No active database connection to disconnect"))
        }
    }

    async fn is_connected(&self) -> bool {
        let guard = self.pool.read().await;
        if let Some(pool) = guard.as_ref() {
            sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
        } else {
            false
        }
    }

    async fn execute(&self, sql: &str) -> Result<QueryExecutionResult> {
        let pool = self.get_pool().await?;

        let sql = sql.trim();
        if sql.is_empty() {
            return Ok(QueryExecutionResult::Error(ErrorResult::new(
                "Empty query".to_string(),
                0,
            )));
        }

        let result = if Self::is_select_query(sql) {
            self.execute_select(sql, &pool).await
        } else {
            self.execute_modification(sql, &pool).await
        };

        self.stats.write().await.record(&result);
        Ok(result)
    }

    async fn last_insert_id(&self) -> Option<u64> {
        self.stats.read().await.last_insert_id
    }

    async fn row_count(&self) -> u64 {
        self.stats.read().await.row_count
    }
}
