//! Bridge Store - access to bridge records
//!
//! Every read is ordered by bridge id, so "the first record" of any filter
//! is the oldest one.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::backends::{DatabasePool, DatabaseRow, DatabaseRowExt, DatabaseValue};
use crate::error::{ModelError, ModelResult};
use crate::query::QueryBuilder;
use super::bridge::DynamicRelationRecord;
use super::morph::{ModelRef, MorphMap, MorphType};
use super::types::{Cardinality, RelationSignature};

/// CRUD and lookup operations over the bridge table
#[derive(Clone)]
pub struct BridgeStore {
    pool: Arc<dyn DatabasePool>,
    table: String,
    morphs: Arc<MorphMap>,
}

impl std::fmt::Debug for BridgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeStore")
            .field("table", &self.table)
            .field("dialect", &self.pool.dialect())
            .finish()
    }
}

impl BridgeStore {
    pub fn new(pool: Arc<dyn DatabasePool>, table: impl Into<String>, morphs: Arc<MorphMap>) -> Self {
        Self {
            pool,
            table: table.into(),
            morphs,
        }
    }

    pub fn pool(&self) -> &Arc<dyn DatabasePool> {
        &self.pool
    }

    /// Bridge table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Table-qualified bridge column
    pub fn column(&self, name: &str) -> String {
        format!("{}.{}", self.table, name)
    }

    fn select(&self) -> QueryBuilder {
        QueryBuilder::new()
            .select(&format!("{}.*", self.table))
            .from(&self.table)
    }

    fn owned_by(&self, owner: &ModelRef) -> QueryBuilder {
        self.select()
            .where_eq(&self.column("model_type"), owner.morph.as_str())
            .where_eq(&self.column("model_id"), owner.id)
    }

    async fn decode_all(&self, query: QueryBuilder) -> ModelResult<Vec<DynamicRelationRecord>> {
        let rows = query.fetch_rows(self.pool.as_ref()).await?;
        rows.iter()
            .map(|row| DynamicRelationRecord::from_row(row.as_ref(), &self.morphs))
            .collect()
    }

    /// Insert one bridge record. Existing edges are not checked.
    pub async fn create(
        &self,
        relation: &str,
        cardinality: Cardinality,
        owner: &ModelRef,
        target: &ModelRef,
    ) -> ModelResult<DynamicRelationRecord> {
        let now = Utc::now();
        let mut record = DynamicRelationRecord::new(relation, cardinality, *owner, *target);
        record.created_at = Some(now);
        record.updated_at = Some(now);

        let insert: QueryBuilder = QueryBuilder::new()
            .insert_into(&self.table)
            .set("relation", relation)
            .set("is_many", record.is_many)
            .set("model_type", owner.morph.as_str())
            .set("model_id", owner.id)
            .set("result_type", target.morph.as_str())
            .set("result_id", target.id)
            .set("created_at", now)
            .set("updated_at", now)
            .returning("id");

        let row = insert
            .fetch_optional_row(self.pool.as_ref())
            .await?
            .ok_or_else(|| ModelError::Database(format!("Insert into {} returned no id", self.table)))?;
        record.id = Some(row.get_i64("id")?);

        tracing::debug!(
            table = %self.table,
            relation = relation,
            owner = %owner,
            target = %target,
            "created bridge record"
        );
        Ok(record)
    }

    /// All bridge records of an owner, any relation name
    pub async fn find_by_owner(&self, owner: &ModelRef) -> ModelResult<Vec<DynamicRelationRecord>> {
        let query = self.owned_by(owner).order_by(&self.column("id"));
        self.decode_all(query).await
    }

    /// Bridge records of an owner under one relation name, in insertion order
    pub async fn find_by_owner_and_name(&self, owner: &ModelRef, relation: &str) -> ModelResult<Vec<DynamicRelationRecord>> {
        let query = self
            .owned_by(owner)
            .where_eq(&self.column("relation"), relation)
            .order_by(&self.column("id"));
        self.decode_all(query).await
    }

    /// Oldest bridge record of an owner under one relation name
    pub async fn first_by_owner_and_name(&self, owner: &ModelRef, relation: &str) -> ModelResult<Option<DynamicRelationRecord>> {
        let query = self
            .owned_by(owner)
            .where_eq(&self.column("relation"), relation)
            .order_by(&self.column("id"))
            .limit(1);
        Ok(self.decode_all(query).await?.into_iter().next())
    }

    /// Signature of the oldest bridge record of an owner under one name,
    /// without resolving its target tag
    pub async fn signature_for_owner(&self, owner: &ModelRef, relation: &str) -> ModelResult<Option<RelationSignature>> {
        let query: QueryBuilder = QueryBuilder::new()
            .select("relation, is_many, result_type")
            .from(&self.table)
            .where_eq("model_type", owner.morph.as_str())
            .where_eq("model_id", owner.id)
            .where_eq("relation", relation)
            .order_by("id")
            .limit(1);

        match query.fetch_optional_row(self.pool.as_ref()).await? {
            Some(row) => Ok(Some(decode_signature(row.as_ref())?)),
            None => Ok(None),
        }
    }

    /// Delete an owner's edges under `relation` that point at any of
    /// `target_ids`. Returns the number of deleted records.
    pub async fn delete_by_owner_name_and_targets(&self, owner: &ModelRef, relation: &str, target_ids: &[i64]) -> ModelResult<u64> {
        if target_ids.is_empty() {
            return Ok(0);
        }

        let delete: QueryBuilder = QueryBuilder::new()
            .delete_from(&self.table)
            .where_eq("model_type", owner.morph.as_str())
            .where_eq("model_id", owner.id)
            .where_eq("relation", relation)
            .where_in("result_id", target_ids.iter().copied());

        let deleted = delete.execute(self.pool.as_ref()).await?;
        tracing::debug!(table = %self.table, relation = relation, owner = %owner, deleted, "deleted bridge records");
        Ok(deleted)
    }

    /// Relation names recorded for any owner of a type, each with the
    /// signature of its oldest record
    pub async fn distinct_names_for_owner_type(&self, owner_type: MorphType) -> ModelResult<Vec<RelationSignature>> {
        let dialect = self.pool.dialect();
        let sql = format!(
            "SELECT relation, is_many, result_type FROM {table} WHERE id IN \
             (SELECT MIN(id) FROM {table} WHERE model_type = {p} GROUP BY relation) ORDER BY relation",
            table = self.table,
            p = dialect.parameter_placeholder(0),
        );

        let rows = self.pool.fetch_all(&sql, &[owner_type.as_str().into()]).await?;
        rows.iter().map(|row| decode_signature(row.as_ref())).collect()
    }

    /// Signature of the oldest record of any owner of a type under one name
    pub async fn first_by_owner_type_and_name(&self, owner_type: MorphType, relation: &str) -> ModelResult<Option<RelationSignature>> {
        let query: QueryBuilder = QueryBuilder::new()
            .select("relation, is_many, result_type")
            .from(&self.table)
            .where_eq("model_type", owner_type.as_str())
            .where_eq("relation", relation)
            .order_by("id")
            .limit(1);

        match query.fetch_optional_row(self.pool.as_ref()).await? {
            Some(row) => Ok(Some(decode_signature(row.as_ref())?)),
            None => Ok(None),
        }
    }

    /// Signature of each owner's oldest record under one name, keyed by
    /// owner id. Owners without records are absent.
    pub async fn signatures_for_owners(
        &self,
        owner_type: MorphType,
        relation: &str,
        owner_ids: &[i64],
    ) -> ModelResult<HashMap<i64, RelationSignature>> {
        if owner_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let dialect = self.pool.dialect();
        let id_placeholders = (0..owner_ids.len())
            .map(|index| dialect.parameter_placeholder(index + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT model_id, relation, is_many, result_type FROM {table} WHERE id IN \
             (SELECT MIN(id) FROM {table} WHERE model_type = {p0} AND relation = {p1} \
             AND model_id IN ({ids}) GROUP BY model_id)",
            table = self.table,
            p0 = dialect.parameter_placeholder(0),
            p1 = dialect.parameter_placeholder(1),
            ids = id_placeholders,
        );

        let mut params: Vec<DatabaseValue> = vec![owner_type.as_str().into(), relation.into()];
        params.extend(owner_ids.iter().map(|id| DatabaseValue::from(*id)));

        let rows = self.pool.fetch_all(&sql, &params).await?;
        rows.iter()
            .map(|row| Ok((row.get_i64("model_id")?, decode_signature(row.as_ref())?)))
            .collect()
    }

    /// Whether the exact edge `owner -relation-> target` is recorded
    pub async fn exists(&self, owner: &ModelRef, relation: &str, target: &ModelRef) -> ModelResult<bool> {
        let query: QueryBuilder = QueryBuilder::new()
            .from(&self.table)
            .where_eq("model_type", owner.morph.as_str())
            .where_eq("model_id", owner.id)
            .where_eq("relation", relation)
            .where_eq("result_type", target.morph.as_str())
            .where_eq("result_id", target.id);
        query.exists(self.pool.as_ref()).await
    }

    /// Whether an owner has any edge under `relation`
    pub async fn owner_has_relation(&self, owner: &ModelRef, relation: &str) -> ModelResult<bool> {
        let query: QueryBuilder = QueryBuilder::new()
            .from(&self.table)
            .where_eq("model_type", owner.morph.as_str())
            .where_eq("model_id", owner.id)
            .where_eq("relation", relation);
        query.exists(self.pool.as_ref()).await
    }

    /// Number of bridge records of an owner
    pub async fn count_by_owner(&self, owner: &ModelRef) -> ModelResult<i64> {
        let query: QueryBuilder = QueryBuilder::new()
            .from(&self.table)
            .where_eq("model_type", owner.morph.as_str())
            .where_eq("model_id", owner.id);
        query.count(self.pool.as_ref()).await
    }

    /// Delete every edge owned by `owner`
    pub async fn purge_owner(&self, owner: &ModelRef) -> ModelResult<u64> {
        let delete: QueryBuilder = QueryBuilder::new()
            .delete_from(&self.table)
            .where_eq("model_type", owner.morph.as_str())
            .where_eq("model_id", owner.id);

        let deleted = delete.execute(self.pool.as_ref()).await?;
        tracing::debug!(table = %self.table, owner = %owner, deleted, "purged owner edges");
        Ok(deleted)
    }

    /// Delete every edge pointing at `target`
    pub async fn purge_target(&self, target: &ModelRef) -> ModelResult<u64> {
        let delete: QueryBuilder = QueryBuilder::new()
            .delete_from(&self.table)
            .where_eq("result_type", target.morph.as_str())
            .where_eq("result_id", target.id);

        let deleted = delete.execute(self.pool.as_ref()).await?;
        tracing::debug!(table = %self.table, target = %target, deleted, "purged target edges");
        Ok(deleted)
    }
}

fn decode_signature(row: &dyn DatabaseRow) -> ModelResult<RelationSignature> {
    Ok(RelationSignature {
        relation: row.get("relation")?,
        cardinality: Cardinality::from_is_many(row.get_bool("is_many")?),
        target_type: row.get("result_type")?,
    })
}
