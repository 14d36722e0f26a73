//! MySQL driver implementation.
//!
//! Provides a MySQL driver that implements the `DatabaseDriver` trait using SQLx.
//!
//! # Example
//!
//! ```ignore
//! use tablesmith::drivers::mysql::MySqlDriver;
//! use tablesmith::traits::{ConnectionConfig, ConnectionParams, DatabaseDriver, DatabaseType};
//!
//! let config = ConnectionConfig::new(
//!     "My MySQL".to_string(),
//!     DatabaseType::MySQL,
//!     ConnectionParams::server(
//!         "localhost".to_string(),
//!         3306,
//!         "user".to_string(),
//!         "password".to_string(),
//!         "mydb".to_string(),
//!     ),
//! );
//!
//! let mut driver = MySqlDriver::new(config);
//! driver.connect().await?;
//! ```

mod connection;
mod types;

pub use connection::MySqlDriver;
pub use types::{MySqlValueConverter, escape_string};
