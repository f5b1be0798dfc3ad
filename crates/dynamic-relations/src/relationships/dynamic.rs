//! Dynamic relations service
//!
//! Owns the bridge store, the morph map and the relation registry, and
//! implements attach/detach and two-step relation resolution for any owner
//! model. Models reach it through [`HasDynamicRelations`].
//!
//! [`HasDynamicRelations`]: super::capability::HasDynamicRelations

use std::sync::Arc;

use crate::backends::DatabasePool;
use crate::config::{ConsistencyPolicy, DuplicateEdgePolicy, DynamicRelationsConfig};
use crate::error::{ModelError, ModelResult, RelationshipError};
use crate::migrations::{create_dynamic_relations_table, Migration, MigrationRunResult, MigrationRunner};
use crate::model::Model;
use super::bridge::DynamicRelationRecord;
use super::capability::{HasDynamicRelations, Targets};
use super::morph::{ModelRef, MorphMap, MorphType};
use super::registrar::{RegisteredRelation, RelationRegistry};
use super::resolver::DynamicRelationship;
use super::store::BridgeStore;
use super::types::{
    is_usable_relation_name, Cardinality, RelationDescriptor, RelationLookup, RelationSignature, RelationValue,
};

/// Entry point of the dynamic relations system
#[derive(Debug)]
pub struct DynamicRelations {
    config: DynamicRelationsConfig,
    morphs: Arc<MorphMap>,
    store: BridgeStore,
    registry: RelationRegistry,
}

impl DynamicRelations {
    /// Service over `pool` with the default configuration
    pub fn new(pool: Arc<dyn DatabasePool>) -> Self {
        Self::build(pool, DynamicRelationsConfig::default())
    }

    /// Service over `pool` with a validated configuration
    pub fn with_config(pool: Arc<dyn DatabasePool>, config: DynamicRelationsConfig) -> ModelResult<Self> {
        config.validate()?;
        Ok(Self::build(pool, config))
    }

    /// Service configured from `ELIF_DYNAMIC_RELATIONS_*` variables
    pub fn from_env(pool: Arc<dyn DatabasePool>) -> ModelResult<Self> {
        Self::with_config(pool, DynamicRelationsConfig::from_env()?)
    }

    fn build(pool: Arc<dyn DatabasePool>, config: DynamicRelationsConfig) -> Self {
        let morphs = Arc::new(MorphMap::new());
        let store = BridgeStore::new(pool, config.bridge_table.clone(), morphs.clone());

        tracing::info!(
            bridge_table = %config.bridge_table,
            consistency = ?config.consistency,
            duplicates = ?config.duplicates,
            "dynamic relations service ready"
        );

        Self {
            config,
            morphs,
            store,
            registry: RelationRegistry::new(),
        }
    }

    pub fn pool(&self) -> &Arc<dyn DatabasePool> {
        self.store.pool()
    }

    pub fn config(&self) -> &DynamicRelationsConfig {
        &self.config
    }

    pub fn store(&self) -> &BridgeStore {
        &self.store
    }

    pub fn registry(&self) -> &RelationRegistry {
        &self.registry
    }

    pub fn morphs(&self) -> &MorphMap {
        &self.morphs
    }

    /// Claim the morph tag of `M` so bridge rows naming it can be decoded.
    ///
    /// Owner and target types are registered automatically when they are
    /// attached or resolved; types only ever read back from storage must be
    /// registered up front.
    pub fn register_model<M: Model + 'static>(&self) -> MorphType {
        self.morphs.register::<M>()
    }

    /// Bridge table migration for the configured table and pool dialect
    pub fn migration(&self) -> Migration {
        create_dynamic_relations_table(&self.config.bridge_table, self.pool().dialect())
    }

    /// Create the bridge table if it has not been created yet
    pub async fn migrate(&self) -> ModelResult<MigrationRunResult> {
        MigrationRunner::new(self.pool().clone())
            .run(&[self.migration()])
            .await
    }

    fn owner_ref<M: Model<PrimaryKey = i64> + 'static>(&self, owner: &M) -> ModelResult<ModelRef> {
        self.morphs.register::<M>();
        ModelRef::of(owner)
    }

    /// Persist edges `owner -relation-> target` for every target.
    ///
    /// A single target records a singular relation, a collection records a
    /// multi-valued one. Cardinality and target type are checked against the
    /// first record of the name for the owner type per the configured
    /// consistency policy.
    pub async fn attach<M, T>(&self, owner: &M, relation: &str, targets: Targets<'_, T>) -> ModelResult<()>
    where
        M: HasDynamicRelations,
        T: Model<PrimaryKey = i64> + 'static,
    {
        if !is_usable_relation_name(relation) {
            return Err(RelationshipError::InvalidName(relation.to_string()).into());
        }

        let owner_ref = self.owner_ref(owner)?;
        let target_type = self.morphs.register::<T>();
        let target_refs = targets
            .iter()
            .map(ModelRef::of)
            .collect::<ModelResult<Vec<_>>>()?;

        if target_refs.is_empty() {
            tracing::debug!(relation = relation, owner = %owner_ref, "nothing to attach");
            return Ok(());
        }

        self.registry.ensure_registered::<M>(&self.store).await?;
        let (cardinality, fresh) = self
            .checked_cardinality(owner_ref.morph, relation, targets.cardinality(), target_type)
            .await?;

        let mut created = 0usize;
        for target in &target_refs {
            if self.config.duplicates == DuplicateEdgePolicy::Skip
                && self.store.exists(&owner_ref, relation, target).await?
            {
                tracing::debug!(relation = relation, owner = %owner_ref, target = %target, "edge already recorded, skipping");
                continue;
            }
            self.store.create(relation, cardinality, &owner_ref, target).await?;
            created += 1;
        }

        let registration = RegisteredRelation {
            cardinality,
            target_type: target_type.as_str().to_string(),
        };
        if fresh {
            self.registry.redeclare::<M>(relation, registration);
        } else {
            self.registry.register::<M>(relation, registration);
        }

        tracing::info!(
            relation = relation,
            owner = %owner_ref,
            cardinality = %cardinality,
            created,
            "attached dynamic relation"
        );
        Ok(())
    }

    /// Cardinality to store new edges with, and whether no record of the
    /// name existed yet for the owner type
    async fn checked_cardinality(
        &self,
        owner_type: MorphType,
        relation: &str,
        requested: Cardinality,
        target_type: MorphType,
    ) -> ModelResult<(Cardinality, bool)> {
        let Some(recorded) = self.store.first_by_owner_type_and_name(owner_type, relation).await? else {
            return Ok((requested, true));
        };

        let policy = self.config.consistency;
        if policy == ConsistencyPolicy::Permissive {
            return Ok((requested, false));
        }

        if recorded.target_type != target_type.as_str() {
            tracing::warn!(
                relation = relation,
                owner_type = %owner_type,
                recorded = %recorded.target_type,
                requested = %target_type,
                "refusing attach with conflicting target type"
            );
            return Err(RelationshipError::TargetTypeConflict {
                model: owner_type.to_string(),
                relation: relation.to_string(),
                recorded: recorded.target_type,
                requested: target_type.to_string(),
            }
            .into());
        }

        if recorded.cardinality == requested {
            return Ok((requested, false));
        }

        match policy {
            ConsistencyPolicy::Coerce => {
                tracing::warn!(
                    relation = relation,
                    owner_type = %owner_type,
                    recorded = %recorded.cardinality,
                    requested = %requested,
                    "coercing attach to recorded cardinality"
                );
                Ok((recorded.cardinality, false))
            }
            _ => {
                tracing::warn!(
                    relation = relation,
                    owner_type = %owner_type,
                    recorded = %recorded.cardinality,
                    requested = %requested,
                    "refusing attach with conflicting cardinality"
                );
                Err(RelationshipError::CardinalityConflict {
                    model: owner_type.to_string(),
                    relation: relation.to_string(),
                    recorded: recorded.cardinality.to_string(),
                    requested: requested.to_string(),
                }
                .into())
            }
        }
    }

    /// Remove the owner's edges under `relation` to the given targets.
    /// Returns the number of deleted bridge records.
    pub async fn detach<M, T>(&self, owner: &M, relation: &str, targets: Targets<'_, T>) -> ModelResult<u64>
    where
        M: HasDynamicRelations,
        T: Model<PrimaryKey = i64> + 'static,
    {
        let owner_ref = self.owner_ref(owner)?;
        let target_ids = targets
            .iter()
            .map(|target| target.primary_key().ok_or(ModelError::MissingPrimaryKey))
            .collect::<ModelResult<Vec<i64>>>()?;

        let deleted = self
            .store
            .delete_by_owner_name_and_targets(&owner_ref, relation, &target_ids)
            .await?;

        tracing::info!(relation = relation, owner = %owner_ref, deleted, "detached dynamic relation");
        Ok(deleted)
    }

    /// Whether the owner has at least one edge under `relation`
    pub async fn has_dynamic_relation<M: HasDynamicRelations>(&self, owner: &M, relation: &str) -> ModelResult<bool> {
        if !is_usable_relation_name(relation) {
            return Ok(false);
        }
        let owner_ref = self.owner_ref(owner)?;
        self.store.owner_has_relation(&owner_ref, relation).await
    }

    /// Cardinality flag of the owner's first edge under `relation`; false
    /// when there is none
    pub async fn is_dynamic_relation_many<M: HasDynamicRelations>(&self, owner: &M, relation: &str) -> ModelResult<bool> {
        if !is_usable_relation_name(relation) {
            return Ok(false);
        }
        let owner_ref = self.owner_ref(owner)?;
        Ok(self
            .store
            .signature_for_owner(&owner_ref, relation)
            .await?
            .map(|signature| signature.cardinality.is_many())
            .unwrap_or(false))
    }

    /// Name, cardinality and target type of one of the owner's relations
    pub async fn describe_dynamic_relation<M: HasDynamicRelations>(
        &self,
        owner: &M,
        relation: &str,
    ) -> ModelResult<Option<RelationDescriptor>> {
        if !is_usable_relation_name(relation) {
            return Ok(None);
        }
        let owner_ref = self.owner_ref(owner)?;
        Ok(self
            .store
            .first_by_owner_and_name(&owner_ref, relation)
            .await?
            .map(|record| RelationDescriptor {
                name: record.relation.clone(),
                cardinality: record.cardinality(),
                target: record.target.morph,
            }))
    }

    /// Raw bridge records of the owner, in insertion order
    pub async fn records<M: HasDynamicRelations>(&self, owner: &M) -> ModelResult<Vec<DynamicRelationRecord>> {
        let owner_ref = self.owner_ref(owner)?;
        self.store.find_by_owner(&owner_ref).await
    }

    /// Through-join relationship for `relation`, or `None` when the owner
    /// has no such dynamic relation.
    ///
    /// Names registered for the owner type resolve from the registry, even
    /// for owners without edges; other names fall back to the owner's own
    /// bridge records. Under [`ConsistencyPolicy::Permissive`] owners of one
    /// type may disagree, so the owner's own oldest record is read first.
    pub async fn dynamic_relationship<M, R>(&self, owner: &M, relation: &str) -> ModelResult<Option<DynamicRelationship<R>>>
    where
        M: HasDynamicRelations,
        R: Model + 'static,
    {
        if !is_usable_relation_name(relation) {
            return Ok(None);
        }

        let owner_ref = self.owner_ref(owner)?;
        self.morphs.register::<R>();
        self.registry.ensure_registered::<M>(&self.store).await?;

        let registered = if self.owner_scoped() {
            match self.store.signature_for_owner(&owner_ref, relation).await? {
                Some(signature) => self.remember::<M>(relation, &signature),
                None => match self.registry.lookup::<M>(relation) {
                    Some(registered) => registered,
                    None => return Ok(None),
                },
            }
        } else {
            match self.registry.lookup::<M>(relation) {
                Some(registered) => registered,
                None => match self.store.signature_for_owner(&owner_ref, relation).await? {
                    Some(signature) => self.remember::<M>(relation, &signature),
                    None => return Ok(None),
                },
            }
        };

        if registered.target_type != R::morph_class() {
            return Err(RelationshipError::TypeMismatch {
                relation: relation.to_string(),
                recorded: registered.target_type,
                requested: R::morph_class().to_string(),
            }
            .into());
        }

        Ok(Some(DynamicRelationship::new(
            relation,
            registered.cardinality,
            owner_ref,
            &self.config.bridge_table,
        )))
    }

    /// Whether a relation's shape is read per owner rather than per owner type
    pub(crate) fn owner_scoped(&self) -> bool {
        self.config.consistency == ConsistencyPolicy::Permissive
    }

    /// Register a name found in storage; first registration wins
    fn remember<M: HasDynamicRelations>(&self, relation: &str, signature: &RelationSignature) -> RegisteredRelation {
        let own = RegisteredRelation::from(signature);
        self.registry.register::<M>(relation, own.clone());
        own
    }

    /// Two-step dispatch: static relations of `M` first, then dynamic ones
    pub async fn resolve_relation<M, R>(&self, owner: &M, relation: &str) -> ModelResult<RelationLookup<R>>
    where
        M: HasDynamicRelations,
        R: Model + 'static,
    {
        if let Some(name) = M::static_relations().iter().copied().find(|name| *name == relation) {
            return Ok(RelationLookup::Static(name));
        }

        match self.dynamic_relationship::<M, R>(owner, relation).await? {
            Some(relationship) => Ok(RelationLookup::Dynamic(relationship)),
            None => {
                tracing::debug!(relation = relation, owner_type = %MorphType::of::<M>(), "unknown relation");
                Ok(RelationLookup::Unknown(relation.to_string()))
            }
        }
    }

    /// Dynamic relationship for `relation`; unknown and static names are
    /// errors
    pub async fn relation<M, R>(&self, owner: &M, relation: &str) -> ModelResult<DynamicRelationship<R>>
    where
        M: HasDynamicRelations,
        R: Model + 'static,
    {
        match self.resolve_relation::<M, R>(owner, relation).await? {
            RelationLookup::Dynamic(relationship) => Ok(relationship),
            RelationLookup::Static(name) => Err(RelationshipError::StaticRelation {
                model: M::morph_class().to_string(),
                relation: name.to_string(),
            }
            .into()),
            RelationLookup::Unknown(name) => Err(RelationshipError::NotFound {
                model: M::morph_class().to_string(),
                relation: name,
            }
            .into()),
        }
    }

    /// Materialized value of a dynamic relation
    pub async fn relation_value<M, R>(&self, owner: &M, relation: &str) -> ModelResult<RelationValue<R>>
    where
        M: HasDynamicRelations,
        R: Model + 'static,
    {
        let relationship = self.relation::<M, R>(owner, relation).await?;
        relationship.get_results(self.pool().as_ref()).await
    }

    /// Delete every edge owned by `owner`
    pub async fn purge_owner<M: HasDynamicRelations>(&self, owner: &M) -> ModelResult<u64> {
        let owner_ref = self.owner_ref(owner)?;
        self.store.purge_owner(&owner_ref).await
    }

    /// Delete every edge pointing at `target`
    pub async fn purge_target<T: Model<PrimaryKey = i64> + 'static>(&self, target: &T) -> ModelResult<u64> {
        self.morphs.register::<T>();
        self.store.purge_target(&ModelRef::of(target)?).await
    }
}
