//! CRUD Operations - Create, Read, Delete operations for models
//!
//! Implements the database operations with parameter binding through the
//! query builder, timestamp management and error handling.

use chrono::Utc;

use crate::backends::DatabasePool;
use crate::error::{ModelError, ModelResult};
use crate::model::core_trait::Model;
use crate::query::QueryBuilder;

/// Trait providing CRUD operations for models
#[allow(async_fn_in_trait)]
pub trait CrudOperations: Model {
    /// Find a model by its primary key
    async fn find(pool: &dyn DatabasePool, id: Self::PrimaryKey) -> ModelResult<Option<Self>> {
        Self::query()
            .where_eq(&Self::qualified_key_name(), id)
            .first(pool)
            .await
    }

    /// Find a model by its primary key or return an error if not found
    async fn find_or_fail(pool: &dyn DatabasePool, id: Self::PrimaryKey) -> ModelResult<Self> {
        Self::find(pool, id.clone())
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("{}({})", Self::table_name(), id)))
    }

    /// Fetch every row of the model's table, ordered by primary key
    async fn all(pool: &dyn DatabasePool) -> ModelResult<Vec<Self>> {
        Self::query()
            .order_by(&Self::qualified_key_name())
            .get(pool)
            .await
    }

    /// Insert a new model and return it as stored, primary key assigned
    async fn create(pool: &dyn DatabasePool, mut model: Self) -> ModelResult<Self> {
        if Self::uses_timestamps() {
            let now = Utc::now();
            model.set_created_at(now);
            model.set_updated_at(now);
        }

        // Sorted so the generated statement is stable between calls
        let mut fields: Vec<_> = model.to_fields().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let insert: QueryBuilder<Self> = QueryBuilder::new()
            .insert_into(Self::table_name())
            .set_values(fields)
            .returning("*");

        let row = insert
            .fetch_optional_row(pool)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to create {}: {}", Self::table_name(), e)))?
            .ok_or_else(|| ModelError::Database(format!("Insert into {} returned no row", Self::table_name())))?;

        Self::from_database_row(row.as_ref())
    }

    /// Delete this model instance from the database
    async fn delete(self, pool: &dyn DatabasePool) -> ModelResult<()> {
        let pk = self.primary_key().ok_or(ModelError::MissingPrimaryKey)?;

        let delete: QueryBuilder<Self> = QueryBuilder::new()
            .delete_from(Self::table_name())
            .where_eq(Self::primary_key_name(), pk);

        delete
            .execute(pool)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to delete {}: {}", Self::table_name(), e)))?;

        Ok(())
    }
}

// Implement CrudOperations for all types that implement Model
impl<T: Model> CrudOperations for T {}
