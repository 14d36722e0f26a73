//! Driver abstraction traits and types.
//!
//! - **Types** (`types`): backend enum, connection configuration, SSL modes
//! - **Row/Value** (`row`): backend-agnostic value representation
//! - **Driver** (`driver`): the driver trait, the escape capability and statement results

pub mod driver;
pub mod row;
pub mod types;

pub use driver::{
    BoxedDriver, DatabaseDriver, ErrorResult, Escape, ExecutionStats, ModifiedResult,
    QueryExecutionResult, SelectResult,
};

pub use row::{Cell, ColumnInfo, Row, Value};

pub use types::{ConnectionConfig, ConnectionParams, DatabaseType, SslMode};
