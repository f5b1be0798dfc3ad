//! Dynamic-relation capability for owner models
//!
//! Implementing [`HasDynamicRelations`] (usually with an empty impl block)
//! gives a model `attach`/`detach` and dynamic relation resolution through a
//! [`DynamicRelations`] service.

use crate::error::ModelResult;
use crate::model::Model;
use super::bridge::DynamicRelationRecord;
use super::dynamic::DynamicRelations;
use super::resolver::DynamicRelationship;
use super::types::{Cardinality, RelationDescriptor, RelationLookup, RelationValue};

/// Targets of an attach or detach: a single model or a collection
#[derive(Debug)]
pub enum Targets<'a, T> {
    One(&'a T),
    Many(Vec<&'a T>),
}

impl<'a, T> Targets<'a, T> {
    /// Cardinality an attach with these targets records
    pub fn cardinality(&self) -> Cardinality {
        match self {
            Targets::One(_) => Cardinality::One,
            Targets::Many(_) => Cardinality::Many,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        let (single, many) = match self {
            Targets::One(target) => (Some(*target), &[][..]),
            Targets::Many(targets) => (None, targets.as_slice()),
        };
        single.into_iter().chain(many.iter().copied())
    }

    pub fn len(&self) -> usize {
        match self {
            Targets::One(_) => 1,
            Targets::Many(targets) => targets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a, T> From<&'a T> for Targets<'a, T> {
    fn from(target: &'a T) -> Self {
        Targets::One(target)
    }
}

impl<'a, T> From<&'a [T]> for Targets<'a, T> {
    fn from(targets: &'a [T]) -> Self {
        Targets::Many(targets.iter().collect())
    }
}

impl<'a, T> From<Vec<&'a T>> for Targets<'a, T> {
    fn from(targets: Vec<&'a T>) -> Self {
        Targets::Many(targets)
    }
}

/// Models that can own dynamic relations
#[allow(async_fn_in_trait)]
pub trait HasDynamicRelations: Model<PrimaryKey = i64> + 'static {
    /// Relations declared in code. They win over dynamic relations of the
    /// same name.
    fn static_relations() -> &'static [&'static str] {
        &[]
    }

    /// Attach one target (singular relation) or a collection (multi-valued)
    async fn attach<'a, T>(
        &self,
        relations: &DynamicRelations,
        relation: &str,
        targets: impl Into<Targets<'a, T>>,
    ) -> ModelResult<()>
    where
        T: Model<PrimaryKey = i64> + 'static,
    {
        relations.attach(self, relation, targets.into()).await
    }

    /// Detach targets from a relation, returning the number of removed edges
    async fn detach<'a, T>(
        &self,
        relations: &DynamicRelations,
        relation: &str,
        targets: impl Into<Targets<'a, T>>,
    ) -> ModelResult<u64>
    where
        T: Model<PrimaryKey = i64> + 'static,
    {
        relations.detach(self, relation, targets.into()).await
    }

    async fn has_dynamic_relation(&self, relations: &DynamicRelations, relation: &str) -> ModelResult<bool> {
        relations.has_dynamic_relation(self, relation).await
    }

    async fn is_dynamic_relation_many(&self, relations: &DynamicRelations, relation: &str) -> ModelResult<bool> {
        relations.is_dynamic_relation_many(self, relation).await
    }

    async fn describe_dynamic_relation(
        &self,
        relations: &DynamicRelations,
        relation: &str,
    ) -> ModelResult<Option<RelationDescriptor>> {
        relations.describe_dynamic_relation(self, relation).await
    }

    /// Raw bridge records owned by this model
    async fn dynamic_relations(&self, relations: &DynamicRelations) -> ModelResult<Vec<DynamicRelationRecord>> {
        relations.records(self).await
    }

    async fn dynamic_relationship<R: Model + 'static>(
        &self,
        relations: &DynamicRelations,
        relation: &str,
    ) -> ModelResult<Option<DynamicRelationship<R>>> {
        relations.dynamic_relationship::<Self, R>(self, relation).await
    }

    /// Resolve a name to a static relation, a dynamic relation or unknown
    async fn resolve_relation<R: Model + 'static>(
        &self,
        relations: &DynamicRelations,
        relation: &str,
    ) -> ModelResult<RelationLookup<R>> {
        relations.resolve_relation::<Self, R>(self, relation).await
    }

    async fn relation<R: Model + 'static>(
        &self,
        relations: &DynamicRelations,
        relation: &str,
    ) -> ModelResult<DynamicRelationship<R>> {
        relations.relation::<Self, R>(self, relation).await
    }

    async fn relation_value<R: Model + 'static>(
        &self,
        relations: &DynamicRelations,
        relation: &str,
    ) -> ModelResult<RelationValue<R>> {
        relations.relation_value::<Self, R>(self, relation).await
    }

    /// Remove every edge this model owns
    async fn purge_dynamic_relations(&self, relations: &DynamicRelations) -> ModelResult<u64> {
        relations.purge_owner(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_cardinality_follows_shape() {
        let one = 1;
        let many = vec![1, 2, 3];

        let single: Targets<'_, i32> = (&one).into();
        assert_eq!(single.cardinality(), Cardinality::One);
        assert_eq!(single.iter().copied().collect::<Vec<_>>(), vec![1]);

        let collection: Targets<'_, i32> = many.as_slice().into();
        assert_eq!(collection.cardinality(), Cardinality::Many);
        assert_eq!(collection.len(), 3);

        let empty: Targets<'_, i32> = Vec::new().into();
        assert!(empty.is_empty());
        assert_eq!(empty.cardinality(), Cardinality::Many);
    }
}
