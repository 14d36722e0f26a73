//! Declarative table schemas and their compilation to DDL.
//!
//! - **Registry** (`registry`): descriptors and the read-only `SchemaRegistry`
//! - **Foreign keys** (`foreign_key`): referential actions and validation
//! - **Columns** (`column`): single column clause rendering
//! - **Compiler** (`compiler`): full `CREATE TABLE IF NOT EXISTS` statements

pub mod column;
pub mod compiler;
pub mod foreign_key;
pub mod registry;

pub use compiler::TableCompiler;
pub use foreign_key::{ForeignKey, ReferentialAction};
pub use registry::{
    ColumnDescriptor, DefaultValue, ForeignKeyDescriptor, SchemaRegistry, TableDescriptor,
};
