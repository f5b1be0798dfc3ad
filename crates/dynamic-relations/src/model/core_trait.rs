//! Core Model Trait - Base definition for database entities
//!
//! Defines the Model trait with table metadata, primary key handling,
//! timestamp configuration, the polymorphic type tag and the row mapping
//! contract.

use std::collections::HashMap;
use std::fmt::Debug;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::backends::{DatabaseRow, DatabaseValue};
use crate::error::ModelResult;
use crate::query::QueryBuilder;

/// Core trait for database models
pub trait Model: Send + Sync + Debug + Sized + Serialize + for<'de> Deserialize<'de> {
    /// The type used for this model's primary key
    type PrimaryKey: Clone + Send + Sync + Debug + std::fmt::Display + Into<DatabaseValue>;

    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key column name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Type tag written to polymorphic `*_type` columns.
    ///
    /// Defaults to the table name. Must be unique across the models that
    /// take part in polymorphic references.
    fn morph_class() -> &'static str {
        Self::table_name()
    }

    /// Get the primary key value for this model instance
    fn primary_key(&self) -> Option<Self::PrimaryKey>;

    /// Set the primary key value for this model instance
    fn set_primary_key(&mut self, key: Self::PrimaryKey);

    /// Check if this model uses timestamps (created_at, updated_at)
    fn uses_timestamps() -> bool {
        false
    }

    /// Set created_at timestamp
    fn set_created_at(&mut self, _timestamp: DateTime<Utc>) {}

    /// Set updated_at timestamp
    fn set_updated_at(&mut self, _timestamp: DateTime<Utc>) {}

    /// Create a model instance from a database row
    fn from_database_row(row: &dyn DatabaseRow) -> ModelResult<Self>;

    /// Column values to persist, excluding the primary key
    fn to_fields(&self) -> HashMap<String, DatabaseValue>;

    /// Start a query over this model's table
    fn query() -> QueryBuilder<Self> {
        QueryBuilder::new().from(Self::table_name())
    }

    /// Fully qualified primary key column (`table.pk`)
    fn qualified_key_name() -> String {
        format!("{}.{}", Self::table_name(), Self::primary_key_name())
    }
}
