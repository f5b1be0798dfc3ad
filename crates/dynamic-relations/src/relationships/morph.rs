//! Polymorphic references
//!
//! A `ModelRef` names one row of any model type by its morph tag and id.
//! Tags read back from storage are resolved through a `MorphMap`, so a row
//! carrying a tag no registered model claims fails when it is decoded.

use std::any::TypeId;
use std::fmt;

use dashmap::DashMap;

use crate::error::{ModelError, ModelResult};
use crate::model::Model;

/// Type tag stored in polymorphic `*_type` columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MorphType(&'static str);

impl MorphType {
    /// Tag of a model type
    pub fn of<M: Model>() -> Self {
        MorphType(M::morph_class())
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Whether this tag belongs to model `M`
    pub fn is<M: Model>(&self) -> bool {
        self.0 == M::morph_class()
    }
}

impl fmt::Display for MorphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Reference to a model row: `(type tag, id)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelRef {
    pub morph: MorphType,
    pub id: i64,
}

impl ModelRef {
    pub fn new(morph: MorphType, id: i64) -> Self {
        Self { morph, id }
    }

    /// Reference to a saved model; unsaved models have no id to point at
    pub fn of<M: Model<PrimaryKey = i64>>(model: &M) -> ModelResult<Self> {
        let id = model.primary_key().ok_or(ModelError::MissingPrimaryKey)?;
        Ok(Self::new(MorphType::of::<M>(), id))
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.morph, self.id)
    }
}

/// Registry of the morph tags models have claimed
#[derive(Debug, Default)]
pub struct MorphMap {
    tags: DashMap<&'static str, TypeId>,
}

impl MorphMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `M`'s tag. Re-registering the same model is a no-op; a tag
    /// claimed by another type keeps its first owner.
    pub fn register<M: Model + 'static>(&self) -> MorphType {
        let tag = M::morph_class();
        let type_id = TypeId::of::<M>();

        let owner = *self.tags.entry(tag).or_insert(type_id);
        if owner != type_id {
            tracing::warn!(
                "Morph type '{}' is already claimed by another model, ignoring {}",
                tag,
                std::any::type_name::<M>()
            );
        }

        MorphType(tag)
    }

    /// Resolve a tag read from storage
    pub fn resolve(&self, tag: &str) -> ModelResult<MorphType> {
        self.tags
            .get(tag)
            .map(|entry| MorphType(*entry.key()))
            .ok_or_else(|| ModelError::UnknownMorphType(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
