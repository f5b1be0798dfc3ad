//! Query Builder WHERE clause operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

impl<M> QueryBuilder<M> {
    fn push_compare<T: Into<DatabaseValue>>(mut self, column: &str, operator: QueryOperator, value: T) -> Self {
        self.where_conditions.push(WhereCondition::Compare {
            column: column.to_string(),
            operator,
            value: value.into(),
        });
        self
    }

    /// Add WHERE condition with equality
    pub fn where_eq<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_compare(column, QueryOperator::Equal, value)
    }

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_compare(column, QueryOperator::NotEqual, value)
    }

    /// Add WHERE condition with greater than
    pub fn where_gt<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_compare(column, QueryOperator::GreaterThan, value)
    }

    /// Add WHERE condition with less than
    pub fn where_lt<T: Into<DatabaseValue>>(self, column: &str, value: T) -> Self {
        self.push_compare(column, QueryOperator::LessThan, value)
    }

    /// Add WHERE condition with LIKE
    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.push_compare(column, QueryOperator::Like, pattern)
    }

    /// Add WHERE condition with an explicit operator
    pub fn where_condition<T: Into<DatabaseValue>>(self, column: &str, operator: QueryOperator, value: T) -> Self {
        self.push_compare(column, operator, value)
    }

    /// Add WHERE condition with IN
    ///
    /// An empty list matches no rows.
    pub fn where_in<T, I>(mut self, column: &str, values: I) -> Self
    where
        T: Into<DatabaseValue>,
        I: IntoIterator<Item = T>,
    {
        self.where_conditions.push(WhereCondition::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        });
        self
    }

    /// Add WHERE condition with NOT IN
    pub fn where_not_in<T, I>(mut self, column: &str, values: I) -> Self
    where
        T: Into<DatabaseValue>,
        I: IntoIterator<Item = T>,
    {
        self.where_conditions.push(WhereCondition::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        });
        self
    }

    /// Add WHERE condition with IS NULL
    pub fn where_null(mut self, column: &str) -> Self {
        self.where_conditions.push(WhereCondition::Null {
            column: column.to_string(),
            negated: false,
        });
        self
    }

    /// Add WHERE condition with IS NOT NULL
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.where_conditions.push(WhereCondition::Null {
            column: column.to_string(),
            negated: true,
        });
        self
    }

    /// Compare two columns, typically to correlate a subquery with its outer query
    pub fn where_column(mut self, left: &str, operator: QueryOperator, right: &str) -> Self {
        self.where_conditions.push(WhereCondition::Columns {
            left: left.to_string(),
            operator,
            right: right.to_string(),
        });
        self
    }

    /// Add EXISTS subquery condition
    pub fn where_exists<T>(mut self, subquery: QueryBuilder<T>) -> Self {
        self.where_conditions.push(WhereCondition::Exists {
            subquery: Box::new(subquery.cast()),
            negated: false,
        });
        self
    }

    /// Add NOT EXISTS subquery condition
    pub fn where_not_exists<T>(mut self, subquery: QueryBuilder<T>) -> Self {
        self.where_conditions.push(WhereCondition::Exists {
            subquery: Box::new(subquery.cast()),
            negated: true,
        });
        self
    }

    /// Compare the row count of a correlated subquery, `(SELECT COUNT(*) ...) <op> count`
    pub fn where_subquery_count<T>(mut self, subquery: QueryBuilder<T>, operator: QueryOperator, count: i64) -> Self {
        self.where_conditions.push(WhereCondition::SubqueryCount {
            subquery: Box::new(subquery.cast()),
            operator,
            count,
        });
        self
    }
}
