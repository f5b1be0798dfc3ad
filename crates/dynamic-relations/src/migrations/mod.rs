//! Migration System
//!
//! Schema DSL, the bridge table migration and a runner that tracks applied
//! migrations in a table.

pub mod definitions;
pub mod dynamic_relations;
pub mod runner;
pub mod schema_builder;

pub use definitions::{Migration, MigrationRecord, MigrationRunResult, MigrationStatus, RollbackResult};
pub use dynamic_relations::create_dynamic_relations_table;
pub use runner::MigrationRunner;
pub use schema_builder::{SchemaBuilder, TableBuilder};
