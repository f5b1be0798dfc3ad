//! Query Builder DML operations (INSERT, DELETE)

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

impl<M> QueryBuilder<M> {
    /// Start an INSERT query
    pub fn insert_into(mut self, table: &str) -> Self {
        self.query_type = QueryType::Insert;
        self.insert_table = Some(table.to_string());
        self
    }

    /// Start a DELETE query
    pub fn delete_from(mut self, table: &str) -> Self {
        self.query_type = QueryType::Delete;
        self.delete_table = Some(table.to_string());
        self
    }

    /// Set a column value (for INSERT)
    pub fn set<T: Into<DatabaseValue>>(mut self, column: &str, value: T) -> Self {
        self.set_clauses.push(SetClause {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Set multiple values at once
    pub fn set_values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (String, DatabaseValue)>,
    {
        self.set_clauses.extend(
            values
                .into_iter()
                .map(|(column, value)| SetClause { column, value }),
        );
        self
    }

    /// Columns returned by an INSERT (`RETURNING ...`)
    pub fn returning(mut self, columns: &str) -> Self {
        self.returning.extend(
            columns
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        );
        self
    }
}
