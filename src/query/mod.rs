//! CRUD statement building.

pub mod builder;
pub mod params;

pub use builder::StatementBuilder;
pub use params::{SelectParams, Values};
