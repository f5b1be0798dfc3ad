//! Query Builder execution against a `DatabasePool`

use crate::backends::{DatabasePool, DatabaseRow, DatabaseRowExt};
use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use super::builder::QueryBuilder;

impl<M> QueryBuilder<M> {
    /// Execute the query and return the raw rows
    pub async fn fetch_rows(&self, pool: &dyn DatabasePool) -> ModelResult<Vec<Box<dyn DatabaseRow>>> {
        let (sql, params) = self.to_sql_with_params(pool.dialect());
        tracing::debug!(sql = %sql, params = params.len(), "fetching rows");
        pool.fetch_all(&sql, &params).await
    }

    /// Execute the query and return the first raw row
    pub async fn fetch_optional_row(&self, pool: &dyn DatabasePool) -> ModelResult<Option<Box<dyn DatabaseRow>>> {
        let (sql, params) = self.to_sql_with_params(pool.dialect());
        tracing::debug!(sql = %sql, params = params.len(), "fetching row");
        pool.fetch_optional(&sql, &params).await
    }

    /// Execute an INSERT or DELETE statement, returning the affected row count
    pub async fn execute(&self, pool: &dyn DatabasePool) -> ModelResult<u64> {
        let (sql, params) = self.to_sql_with_params(pool.dialect());
        tracing::debug!(sql = %sql, params = params.len(), "executing statement");
        pool.execute(&sql, &params).await
    }

    /// Count matching rows
    pub async fn count(&self, pool: &dyn DatabasePool) -> ModelResult<i64> {
        let mut counting = self.clone().clear_order();
        counting.select_fields = vec!["COUNT(*) AS aggregate".to_string()];
        counting.limit_count = None;

        let row = counting
            .fetch_optional_row(pool)
            .await?
            .ok_or_else(|| ModelError::Query("COUNT query returned no row".to_string()))?;

        row.get_i64("aggregate")
    }

    /// Whether at least one row matches
    pub async fn exists(&self, pool: &dyn DatabasePool) -> ModelResult<bool> {
        let mut probe = self.clone().clear_order().limit(1);
        probe.select_fields = vec!["1 AS present".to_string()];
        probe.distinct = false;

        Ok(probe.fetch_optional_row(pool).await?.is_some())
    }
}

// Hydrating methods for Model-typed query builders
impl<M: Model> QueryBuilder<M> {
    /// Execute query and return models
    pub async fn get(&self, pool: &dyn DatabasePool) -> ModelResult<Vec<M>> {
        let rows = self.fetch_rows(pool).await?;

        let mut models = Vec::with_capacity(rows.len());
        for row in rows {
            models.push(M::from_database_row(row.as_ref())?);
        }

        Ok(models)
    }

    /// Execute query and return first model
    pub async fn first(&self, pool: &dyn DatabasePool) -> ModelResult<Option<M>> {
        let query = self.clone().limit(1);
        match query.fetch_optional_row(pool).await? {
            Some(row) => Ok(Some(M::from_database_row(row.as_ref())?)),
            None => Ok(None),
        }
    }

    /// Execute query and return first model or error
    pub async fn first_or_fail(&self, pool: &dyn DatabasePool) -> ModelResult<M> {
        self.first(pool)
            .await?
            .ok_or_else(|| ModelError::NotFound(M::table_name().to_string()))
    }
}
