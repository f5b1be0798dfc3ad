//! Relation Registrar - per-type registry of known dynamic relation names
//!
//! The first time an owner type is used, the relation names persisted for
//! it are discovered from the bridge table and installed here. Afterwards
//! resolving one of those names skips the per-instance bridge lookup,
//! unless the service reads relation shapes per owner.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::error::{ModelError, ModelResult};
use crate::model::Model;
use super::morph::MorphType;
use super::store::BridgeStore;
use super::types::{Cardinality, RelationSignature};

/// What a registered relation name resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRelation {
    pub cardinality: Cardinality,
    /// Target morph tag as recorded
    pub target_type: String,
}

impl From<&RelationSignature> for RegisteredRelation {
    fn from(signature: &RelationSignature) -> Self {
        Self {
            cardinality: signature.cardinality,
            target_type: signature.target_type.clone(),
        }
    }
}

/// Relations known for one owner type
#[derive(Debug)]
struct TypeRelations {
    morph: MorphType,
    discovered: OnceCell<()>,
    names: RwLock<HashMap<String, RegisteredRelation>>,
}

impl TypeRelations {
    fn new(morph: MorphType) -> Self {
        Self {
            morph,
            discovered: OnceCell::new(),
            names: RwLock::new(HashMap::new()),
        }
    }

    fn insert_if_absent(&self, name: &str, relation: RegisteredRelation) -> bool {
        let mut names = self.names.write().unwrap_or_else(PoisonError::into_inner);
        if names.contains_key(name) {
            return false;
        }
        names.insert(name.to_string(), relation);
        true
    }
}

/// Registry mapping owner type identity to its known relation names
#[derive(Debug, Default)]
pub struct RelationRegistry {
    types: DashMap<TypeId, Arc<TypeRelations>>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry<M: Model + 'static>(&self) -> Arc<TypeRelations> {
        self.types
            .entry(TypeId::of::<M>())
            .or_insert_with(|| Arc::new(TypeRelations::new(MorphType::of::<M>())))
            .clone()
    }

    fn existing<M: Model + 'static>(&self) -> Option<Arc<TypeRelations>> {
        self.types.get(&TypeId::of::<M>()).map(|entry| entry.clone())
    }

    /// Discover the relation names persisted for `M`, once.
    ///
    /// Concurrent first calls share one discovery query. When discovery
    /// fails nothing is recorded and the next call tries again.
    pub async fn ensure_registered<M: Model + 'static>(&self, store: &BridgeStore) -> ModelResult<()> {
        let entry = self.entry::<M>();
        let owner_type = entry.morph;
        let target = entry.clone();

        entry
            .discovered
            .get_or_try_init(|| async move {
                let signatures = store.distinct_names_for_owner_type(owner_type).await?;
                let discovered = signatures.len();

                for signature in &signatures {
                    target.insert_if_absent(&signature.relation, signature.into());
                }

                tracing::debug!(
                    owner_type = %owner_type,
                    discovered,
                    "registered dynamic relations"
                );
                Ok::<(), ModelError>(())
            })
            .await?;

        Ok(())
    }

    /// Install one relation name for `M`. The first registration of a name
    /// wins; returns whether this call installed it.
    pub fn register<M: Model + 'static>(&self, name: &str, relation: RegisteredRelation) -> bool {
        self.entry::<M>().insert_if_absent(name, relation)
    }

    /// Replace the registration of a name whose first bridge record was just
    /// written, so the registry follows the new declaration
    pub(crate) fn redeclare<M: Model + 'static>(&self, name: &str, relation: RegisteredRelation) {
        let entry = self.entry::<M>();
        let mut names = entry.names.write().unwrap_or_else(PoisonError::into_inner);
        names.insert(name.to_string(), relation);
    }

    /// Registration of a name for `M`, if any
    pub fn lookup<M: Model + 'static>(&self, name: &str) -> Option<RegisteredRelation> {
        let entry = self.existing::<M>()?;
        let names = entry.names.read().unwrap_or_else(PoisonError::into_inner);
        names.get(name).cloned()
    }

    pub fn contains<M: Model + 'static>(&self, name: &str) -> bool {
        self.lookup::<M>(name).is_some()
    }

    /// Registered names for `M`, sorted
    pub fn names<M: Model + 'static>(&self) -> Vec<String> {
        let Some(entry) = self.existing::<M>() else {
            return Vec::new();
        };
        let names = entry.names.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = names.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether discovery has completed for `M`
    pub fn is_discovered<M: Model + 'static>(&self) -> bool {
        self.existing::<M>()
            .map(|entry| entry.discovered.initialized())
            .unwrap_or(false)
    }
}
