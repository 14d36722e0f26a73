//! SQLite driver implementation.
//!
//! Supports file-based databases (`ConnectionParams::File`) and private
//! in-memory databases (`ConnectionParams::InMemory`), both through SQLx.

mod connection;
mod types;

pub use connection::SqliteDriver;
pub use types::{SqliteValueConverter, escape_string};
