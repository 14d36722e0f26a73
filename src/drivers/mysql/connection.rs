//! MySQL driver implementation.
//!
//! This module implements the `DatabaseDriver` trait for MySQL
//! using SQLx's MySqlPool.

use anyhow::{Result, anyhow};
use async_lock::RwLock;
use async_trait::async_trait;
use sqlx::MySqlPool;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::time::{Duration, Instant};

use super::types::{MySqlValueConverter, escape_string};
use crate::traits::{
    BoxedDriver, ConnectionConfig, ConnectionParams, DatabaseDriver, DatabaseType, ErrorResult,
    Escape, ExecutionStats, ModifiedResult, QueryExecutionResult, Row, SelectResult,
};

/// MySQL driver.
///
/// Wraps a SQLx MySqlPool and implements the `DatabaseDriver` trait.
pub struct MySqlDriver {
    config: ConnectionConfig,
    pool: RwLock<Option<MySqlPool>>,
    stats: RwLock<ExecutionStats>,
}

impl std::fmt::Debug for MySqlDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlDriver")
            .field("config", &self.config)
            .field("pool", &"<MySqlPool>")
            .finish()
    }
}

impl MySqlDriver {
    /// Create a new MySQL driver from configuration.
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

    /// Build MySqlConnectOptions from the configuration.
    fn build_connect_options(&self) -> Result<MySqlConnectOptions> {
        match &self.config.params {
            ConnectionParams::Server {
                hostname,
                port,
                username,
                password,
                database,
                ssl_mode,
                ..
            } => {
                Ok(MySqlConnectOptions::new()
                    .host(hostname)
                    .port(*port)
                    .username(username)
                    .password(password)
                    .database(database)
                    .ssl_mode(MySqlValueConverter::map_ssl_mode(ssl_mode)))
            }
            ConnectionParams::File { .. } | ConnectionParams::InMemory => Err(anyhow!(
                "MySQL does not support file-based or in-memory connections"
            )),
        }
    }

    /// Get the connection pool, or an error if not connected.
    async fn get_pool(&self) -> Result<MySqlPool> {
        let guard = self.pool.read().await;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow!("Database not connected"))
    }

    /// Check if the statement returns rows.
    fn is_select_query(sql: &str) -> bool {
        let lower = sql.to_lowercase();
        let trimmed = lower.trim_start();
        trimmed.starts_with("select")
            || trimmed.starts_with("with")
            || trimmed.starts_with("show")
            || trimmed.starts_with("describe")
            || trimmed.starts_with("desc ")
            || trimmed.starts_with("explain")
    }

    async fn execute_select(&self, sql: &str, pool: &MySqlPool) -> QueryExecutionResult {
        let start_time = Instant::now();

        match sqlx::query(sql).fetch_all(pool).await {
            Ok(mysql_rows) => {
                let execution_time_ms = start_time.elapsed().as_millis();

                let columns = mysql_rows
                    .first()
                    .map(MySqlValueConverter::build_column_info)
                    .unwrap_or_default();
                let rows: Vec<Row> = mysql_rows
                    .iter()
                    .map(MySqlValueConverter::convert_row)
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

    async fn execute_modification(&self, sql: &str, pool: &MySqlPool) -> QueryExecutionResult {
        let start_time = Instant::now();

        match sqlx::query(sql).execute(pool).await {
            Ok(result) => {
                let mut modified =
                    ModifiedResult::new(result.rows_affected(), start_time.elapsed().as_millis());
                // MySQL reports 0 when the statement generated no id
                if result.last_insert_id() != 0 {
                    modified = modified.with_last_insert_id(result.last_insert_id());
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

impl Escape for MySqlDriver {
    fn escape(&self, value: &str) -> String {
        escape_string(value)
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&mut self) -> Result<()> {
        let options = self.build_connect_options()?;

        // one facade drives one connection at a time
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

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
