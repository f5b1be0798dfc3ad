//! Query Builder - Core builder implementation

use std::marker::PhantomData;

use super::types::*;

/// Query builder for constructing database queries
///
/// `M` is the model the rows hydrate into; untyped builders (`M = ()`) are
/// used for subqueries and raw row access.
#[derive(Debug)]
pub struct QueryBuilder<M = ()> {
    pub(crate) query_type: QueryType,
    pub(crate) select_fields: Vec<String>,
    pub(crate) from_table: Option<String>,
    pub(crate) insert_table: Option<String>,
    pub(crate) delete_table: Option<String>,
    pub(crate) set_clauses: Vec<SetClause>,
    pub(crate) returning: Vec<String>,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) limit_count: Option<i64>,
    pub(crate) distinct: bool,
    _phantom: PhantomData<M>,
}

impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            query_type: self.query_type,
            select_fields: self.select_fields.clone(),
            from_table: self.from_table.clone(),
            insert_table: self.insert_table.clone(),
            delete_table: self.delete_table.clone(),
            set_clauses: self.set_clauses.clone(),
            returning: self.returning.clone(),
            where_conditions: self.where_conditions.clone(),
            joins: self.joins.clone(),
            order_by: self.order_by.clone(),
            limit_count: self.limit_count,
            distinct: self.distinct,
            _phantom: PhantomData,
        }
    }
}

impl<M> Default for QueryBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> QueryBuilder<M> {
    /// Create a new query builder
    pub fn new() -> Self {
        Self {
            query_type: QueryType::Select,
            select_fields: Vec::new(),
            from_table: None,
            insert_table: None,
            delete_table: None,
            set_clauses: Vec::new(),
            returning: Vec::new(),
            where_conditions: Vec::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            limit_count: None,
            distinct: false,
            _phantom: PhantomData,
        }
    }

    /// Reinterpret the rows of this query as another model type
    pub fn cast<N>(self) -> QueryBuilder<N> {
        QueryBuilder {
            query_type: self.query_type,
            select_fields: self.select_fields,
            from_table: self.from_table,
            insert_table: self.insert_table,
            delete_table: self.delete_table,
            set_clauses: self.set_clauses,
            returning: self.returning,
            where_conditions: self.where_conditions,
            joins: self.joins,
            order_by: self.order_by,
            limit_count: self.limit_count,
            distinct: self.distinct,
            _phantom: PhantomData,
        }
    }

    /// The table rows are selected from, if set
    pub fn table(&self) -> Option<&str> {
        self.from_table.as_deref()
    }

    /// Current WHERE conditions, in the order they were added
    pub fn conditions(&self) -> &[WhereCondition] {
        &self.where_conditions
    }
}
