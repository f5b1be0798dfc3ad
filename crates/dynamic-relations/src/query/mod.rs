//! Query Builder Module - Fluent query builder used by the relation engine
//!
//! Values are carried as `DatabaseValue` and bound as parameters; SQL is
//! rendered per dialect by `to_sql_with_params`.

pub mod builder;
pub mod dml;
pub mod execution;
pub mod joins;
pub mod ordering;
pub mod pagination;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use types::{JoinType, OrderDirection, QueryOperator, WhereCondition};
