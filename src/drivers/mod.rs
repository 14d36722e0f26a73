//! Database driver implementations.
//!
//! - **MySQL**: MySQL/MariaDB support via SQLx
//! - **SQLite**: embedded SQLite support via SQLx, used for tests and local files
//!
//! Each driver implements the `DatabaseDriver` and `Escape` traits.

mod factory;

pub mod mysql;
pub mod sqlite;

pub use factory::ConnectionFactory;
pub use mysql::MySqlDriver;
pub use sqlite::SqliteDriver;
