//! Model System - Model trait and persistence operations for database entities
//!
//! - `core_trait`: Core Model trait definition
//! - `crud_operations`: Create, Read, Delete operations over a `DatabasePool`

pub mod core_trait;
pub mod crud_operations;

pub use core_trait::Model;
pub use crud_operations::CrudOperations;
