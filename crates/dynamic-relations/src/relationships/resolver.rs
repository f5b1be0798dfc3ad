//! Relation Resolver - through-join relationships over the bridge table
//!
//! A dynamic relation `owner -name-> R` is a has-one/has-many-through:
//!
//! ```sql
//! SELECT targets.* FROM targets
//! INNER JOIN bridge ON bridge.result_id = targets.id
//! WHERE bridge.model_id = ? AND bridge.relation = ?
//!   AND bridge.model_type = ? AND bridge.result_type = ?
//! ORDER BY bridge.id
//! ```

use std::fmt;

use async_trait::async_trait;

use crate::backends::DatabasePool;
use crate::error::ModelResult;
use crate::model::Model;
use crate::query::QueryBuilder;
use super::loader::{Lazy, RelationshipLoader};
use super::morph::{ModelRef, MorphType};
use super::types::{Cardinality, RelationValue};

/// Alias the target table takes in existence subqueries whose owner and
/// target share a table
pub const SELF_TARGET_ALIAS: &str = "dr_target";

/// Through-join from bridge records of owners of `owner_type` under
/// `relation` to rows of `R`, not yet narrowed to any owner
pub(crate) fn through_join<R: Model>(bridge_table: &str, relation: &str, owner_type: MorphType) -> QueryBuilder<R> {
    through_join_from(R::query(), R::table_name(), bridge_table, relation, owner_type)
}

/// [`through_join`] reading `R` through `alias`, so the join can be nested
/// inside a query over the same table
pub(crate) fn aliased_through_join<R: Model>(
    alias: &str,
    bridge_table: &str,
    relation: &str,
    owner_type: MorphType,
) -> QueryBuilder<R> {
    let source = QueryBuilder::new().from(&format!("{} AS {}", R::table_name(), alias));
    through_join_from(source, alias, bridge_table, relation, owner_type)
}

fn through_join_from<R: Model>(
    source: QueryBuilder<R>,
    target: &str,
    bridge_table: &str,
    relation: &str,
    owner_type: MorphType,
) -> QueryBuilder<R> {
    let bridge = |column: &str| format!("{}.{}", bridge_table, column);

    source
        .select(&format!("{}.*", target))
        .join(bridge_table, &bridge("result_id"), &format!("{}.{}", target, R::primary_key_name()))
        .where_eq(&bridge("relation"), relation)
        .where_eq(&bridge("model_type"), owner_type.as_str())
        .where_eq(&bridge("result_type"), R::morph_class())
}

/// A resolved dynamic relation of one owner
pub struct DynamicRelationship<R> {
    name: String,
    cardinality: Cardinality,
    owner: ModelRef,
    target: MorphType,
    bridge_table: String,
    query: QueryBuilder<R>,
}

impl<R> fmt::Debug for DynamicRelationship<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicRelationship")
            .field("name", &self.name)
            .field("cardinality", &self.cardinality)
            .field("owner", &self.owner)
            .field("target", &self.target)
            .field("bridge_table", &self.bridge_table)
            .finish()
    }
}

impl<R> Clone for DynamicRelationship<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            cardinality: self.cardinality,
            owner: self.owner,
            target: self.target,
            bridge_table: self.bridge_table.clone(),
            query: self.query.clone(),
        }
    }
}

impl<R: Model> DynamicRelationship<R> {
    pub(crate) fn new(name: &str, cardinality: Cardinality, owner: ModelRef, bridge_table: &str) -> Self {
        let query = through_join::<R>(bridge_table, name, owner.morph)
            .where_eq(&format!("{}.model_id", bridge_table), owner.id)
            .order_by(&format!("{}.id", bridge_table));

        Self {
            name: name.to_string(),
            cardinality,
            owner,
            target: MorphType::of::<R>(),
            bridge_table: bridge_table.to_string(),
            query,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn is_many(&self) -> bool {
        self.cardinality.is_many()
    }

    pub fn owner(&self) -> ModelRef {
        self.owner
    }

    pub fn target(&self) -> MorphType {
        self.target
    }

    pub fn bridge_table(&self) -> &str {
        &self.bridge_table
    }

    fn qualify(column: &str) -> String {
        if column.contains('.') {
            column.to_string()
        } else {
            format!("{}.{}", R::table_name(), column)
        }
    }

    /// Constrain the targets by a column of `R`
    pub fn where_eq<T: Into<crate::backends::DatabaseValue>>(mut self, column: &str, value: T) -> Self {
        self.query = self.query.where_eq(&Self::qualify(column), value);
        self
    }

    pub fn where_in<T, I>(mut self, column: &str, values: I) -> Self
    where
        T: Into<crate::backends::DatabaseValue>,
        I: IntoIterator<Item = T>,
    {
        self.query = self.query.where_in(&Self::qualify(column), values);
        self
    }

    pub fn where_like(mut self, column: &str, pattern: &str) -> Self {
        self.query = self.query.where_like(&Self::qualify(column), pattern);
        self
    }

    /// Apply arbitrary constraints to the underlying query
    pub fn constrain<F>(mut self, f: F) -> Self
    where
        F: FnOnce(QueryBuilder<R>) -> QueryBuilder<R>,
    {
        self.query = f(self.query);
        self
    }

    /// The through-join query
    pub fn query(&self) -> &QueryBuilder<R> {
        &self.query
    }

    pub fn into_query(self) -> QueryBuilder<R> {
        self.query
    }

    /// All targets in attach order, regardless of cardinality
    pub async fn get(&self, pool: &dyn DatabasePool) -> ModelResult<Vec<R>> {
        self.query.get(pool).await
    }

    /// Oldest attached target
    pub async fn first(&self, pool: &dyn DatabasePool) -> ModelResult<Option<R>> {
        self.query.first(pool).await
    }

    /// Materialize the relation according to its cardinality
    pub async fn get_results(&self, pool: &dyn DatabasePool) -> ModelResult<RelationValue<R>> {
        let value = match self.cardinality {
            Cardinality::One => RelationValue::One(self.first(pool).await?),
            Cardinality::Many => RelationValue::Many(self.get(pool).await?),
        };

        tracing::debug!(
            relation = %self.name,
            owner = %self.owner,
            loaded = value.len(),
            "resolved dynamic relation"
        );
        Ok(value)
    }

    pub async fn count(&self, pool: &dyn DatabasePool) -> ModelResult<i64> {
        self.query.count(pool).await
    }

    pub async fn exists(&self, pool: &dyn DatabasePool) -> ModelResult<bool> {
        self.query.exists(pool).await
    }
}

impl<R: Model + 'static> DynamicRelationship<R> {
    /// Defer loading until first access
    pub fn lazy(self) -> Lazy<RelationValue<R>> {
        Lazy::new(self)
    }
}

#[async_trait]
impl<R: Model + 'static> RelationshipLoader<RelationValue<R>> for DynamicRelationship<R> {
    async fn load(&self, pool: &dyn DatabasePool) -> ModelResult<RelationValue<R>> {
        self.get_results(pool).await
    }
}
