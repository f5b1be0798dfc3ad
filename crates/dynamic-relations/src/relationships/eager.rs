//! Eager loading and existence constraints for dynamic relations
//!
//! `load_dynamic` resolves one relation for many owners with a single
//! through-join; `where_has_dynamic` filters owners by the existence (or
//! number) of matching targets with a correlated subquery.

use std::collections::HashMap;

use crate::backends::DatabaseRowExt;
use crate::error::{ModelError, ModelResult, RelationshipError};
use crate::model::Model;
use crate::query::{QueryBuilder, QueryOperator};
use super::capability::HasDynamicRelations;
use super::dynamic::DynamicRelations;
use super::morph::MorphType;
use super::registrar::RegisteredRelation;
use super::resolver::{aliased_through_join, through_join, SELF_TARGET_ALIAS};
use super::types::{is_usable_relation_name, Cardinality, RelationValue};

/// Alias of the owner id column added to eager loading rows
const THROUGH_KEY: &str = "through_key";

impl DynamicRelations {
    /// Resolve `relation` for every owner at once.
    ///
    /// Returns one entry per owner id: owners without edges map to an empty
    /// value of the relation's cardinality. A name never recorded for the
    /// owner type is a `NotFound` relationship error. Under the permissive
    /// consistency policy each owner's values take the shape of its own
    /// oldest record.
    pub async fn load_dynamic<M, R>(&self, owners: &[M], relation: &str) -> ModelResult<HashMap<i64, RelationValue<R>>>
    where
        M: HasDynamicRelations,
        R: Model + 'static,
    {
        let owner_type = self.register_model::<M>();
        self.register_model::<R>();

        let owner_ids = owners
            .iter()
            .map(|owner| owner.primary_key().ok_or(ModelError::MissingPrimaryKey))
            .collect::<ModelResult<Vec<i64>>>()?;

        let registered = self.registered_for_type::<M>(owner_type, relation).await?;
        let own = if self.owner_scoped() {
            self.store()
                .signatures_for_owners(owner_type, relation, &owner_ids)
                .await?
        } else {
            HashMap::new()
        };

        let mut loaded: HashMap<i64, RelationValue<R>> = HashMap::with_capacity(owner_ids.len());
        for id in &owner_ids {
            let shape = own.get(id).map(RegisteredRelation::from).unwrap_or_else(|| registered.clone());
            if shape.target_type != R::morph_class() {
                return Err(RelationshipError::TypeMismatch {
                    relation: relation.to_string(),
                    recorded: shape.target_type,
                    requested: R::morph_class().to_string(),
                }
                .into());
            }
            let empty = match shape.cardinality {
                Cardinality::One => RelationValue::One(None),
                Cardinality::Many => RelationValue::Many(Vec::new()),
            };
            loaded.insert(*id, empty);
        }
        if owner_ids.is_empty() {
            return Ok(loaded);
        }

        let bridge = &self.config().bridge_table;
        let query = through_join::<R>(bridge, relation, owner_type)
            .select_raw(&format!("{}.model_id AS {}", bridge, THROUGH_KEY))
            .where_in(&format!("{}.model_id", bridge), owner_ids.iter().copied())
            .order_by(&format!("{}.id", bridge));

        let rows = query.fetch_rows(self.pool().as_ref()).await?;
        let fetched = rows.len();

        for row in rows {
            let owner_id = row.get_i64(THROUGH_KEY)?;
            let Some(value) = loaded.get_mut(&owner_id) else {
                continue;
            };
            match value {
                RelationValue::One(slot @ None) => *slot = Some(R::from_database_row(row.as_ref())?),
                RelationValue::One(Some(_)) => {}
                RelationValue::Many(targets) => targets.push(R::from_database_row(row.as_ref())?),
            }
        }

        tracing::debug!(
            relation = relation,
            owner_type = %owner_type,
            owners = owner_ids.len(),
            fetched,
            "eager loaded dynamic relation"
        );
        Ok(loaded)
    }

    async fn registered_for_type<M: HasDynamicRelations>(
        &self,
        owner_type: MorphType,
        relation: &str,
    ) -> ModelResult<RegisteredRelation> {
        let not_found = || -> ModelError {
            RelationshipError::NotFound {
                model: owner_type.to_string(),
                relation: relation.to_string(),
            }
            .into()
        };

        if !is_usable_relation_name(relation) {
            return Err(not_found());
        }

        self.registry().ensure_registered::<M>(self.store()).await?;
        if let Some(registered) = self.registry().lookup::<M>(relation) {
            return Ok(registered);
        }

        let signature = self
            .store()
            .first_by_owner_type_and_name(owner_type, relation)
            .await?
            .ok_or_else(not_found)?;
        let registered = RegisteredRelation::from(&signature);
        self.registry().register::<M>(relation, registered.clone());
        Ok(registered)
    }

    fn existence_subquery<M, R, F>(&self, relation: &str, constrain: F) -> ModelResult<QueryBuilder>
    where
        M: HasDynamicRelations,
        R: Model + 'static,
        F: FnOnce(QueryBuilder<R>) -> QueryBuilder<R>,
    {
        if !is_usable_relation_name(relation) {
            return Err(RelationshipError::InvalidName(relation.to_string()).into());
        }

        let owner_type = self.register_model::<M>();
        self.register_model::<R>();

        let bridge = &self.config().bridge_table;
        let join = if M::table_name() == R::table_name() {
            aliased_through_join::<R>(SELF_TARGET_ALIAS, bridge, relation, owner_type)
        } else {
            through_join::<R>(bridge, relation, owner_type)
        };
        let subquery = join.where_column(
            &format!("{}.model_id", bridge),
            QueryOperator::Equal,
            &M::qualified_key_name(),
        );

        Ok(constrain(subquery).cast())
    }

    /// Restrict `query` to owners with at least one `relation` target
    /// matching `constrain`.
    ///
    /// When owner and target share a table, the target side of the
    /// subquery is aliased [`SELF_TARGET_ALIAS`] and constraints must
    /// qualify its columns with that alias.
    pub fn where_has_dynamic<M, R, F>(&self, query: QueryBuilder<M>, relation: &str, constrain: F) -> ModelResult<QueryBuilder<M>>
    where
        M: HasDynamicRelations,
        R: Model + 'static,
        F: FnOnce(QueryBuilder<R>) -> QueryBuilder<R>,
    {
        let subquery = self.existence_subquery::<M, R, F>(relation, constrain)?;
        Ok(query.where_exists(subquery))
    }

    /// Restrict `query` to owners without any `relation` target matching
    /// `constrain`
    pub fn where_doesnt_have_dynamic<M, R, F>(
        &self,
        query: QueryBuilder<M>,
        relation: &str,
        constrain: F,
    ) -> ModelResult<QueryBuilder<M>>
    where
        M: HasDynamicRelations,
        R: Model + 'static,
        F: FnOnce(QueryBuilder<R>) -> QueryBuilder<R>,
    {
        let subquery = self.existence_subquery::<M, R, F>(relation, constrain)?;
        Ok(query.where_not_exists(subquery))
    }

    /// Restrict `query` by the number of matching `relation` targets
    pub fn where_has_dynamic_count<M, R, F>(
        &self,
        query: QueryBuilder<M>,
        relation: &str,
        constrain: F,
        operator: QueryOperator,
        count: i64,
    ) -> ModelResult<QueryBuilder<M>>
    where
        M: HasDynamicRelations,
        R: Model + 'static,
        F: FnOnce(QueryBuilder<R>) -> QueryBuilder<R>,
    {
        let subquery = self.existence_subquery::<M, R, F>(relation, constrain)?;
        Ok(query.where_subquery_count(subquery, operator, count))
    }
}
