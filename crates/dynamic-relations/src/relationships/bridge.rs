//! Bridge record - one persisted edge of a dynamic relation

use chrono::{DateTime, Utc};

use crate::backends::{DatabaseRow, DatabaseRowExt};
use crate::error::ModelResult;
use super::morph::{ModelRef, MorphMap};
use super::types::Cardinality;

/// A row of the bridge table
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRelationRecord {
    pub id: Option<i64>,
    pub relation: String,
    pub is_many: bool,
    /// `model_type`, `model_id`
    pub owner: ModelRef,
    /// `result_type`, `result_id`
    pub target: ModelRef,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DynamicRelationRecord {
    /// Unsaved record for an edge
    pub fn new(relation: &str, cardinality: Cardinality, owner: ModelRef, target: ModelRef) -> Self {
        Self {
            id: None,
            relation: relation.to_string(),
            is_many: cardinality.is_many(),
            owner,
            target,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        Cardinality::from_is_many(self.is_many)
    }

    /// Decode a bridge row, resolving both type tags through `morphs`
    pub fn from_row(row: &dyn DatabaseRow, morphs: &MorphMap) -> ModelResult<Self> {
        let model_type: String = row.get("model_type")?;
        let result_type: String = row.get("result_type")?;

        Ok(Self {
            id: Some(row.get_i64("id")?),
            relation: row.get("relation")?,
            is_many: row.get_bool("is_many")?,
            owner: ModelRef::new(morphs.resolve(&model_type)?, row.get_i64("model_id")?),
            target: ModelRef::new(morphs.resolve(&result_type)?, row.get_i64("result_id")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
