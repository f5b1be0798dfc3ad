//! Dynamic relationship types - cardinality, resolved values and descriptors

use std::fmt;

use super::morph::MorphType;

/// Name under which an owner's raw bridge records are exposed.
///
/// Never usable as a dynamic relation name.
pub const RESERVED_RELATION_NAME: &str = "dynamic_relations";

/// Whether a relation resolves to one target or many
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    /// Cardinality stored as the bridge `is_many` flag
    pub fn from_is_many(is_many: bool) -> Self {
        if is_many {
            Cardinality::Many
        } else {
            Cardinality::One
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Cardinality::Many)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::One => write!(f, "one"),
            Cardinality::Many => write!(f, "many"),
        }
    }
}

/// Materialized result of a dynamic relation
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue<R> {
    /// Singular relation, `None` when no target is attached
    One(Option<R>),
    /// Multi-valued relation in attach order
    Many(Vec<R>),
}

impl<R> RelationValue<R> {
    pub fn cardinality(&self) -> Cardinality {
        match self {
            RelationValue::One(_) => Cardinality::One,
            RelationValue::Many(_) => Cardinality::Many,
        }
    }

    /// Number of resolved targets
    pub fn len(&self) -> usize {
        match self {
            RelationValue::One(value) => usize::from(value.is_some()),
            RelationValue::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The singular value, if this is a singular relation
    pub fn as_one(&self) -> Option<&R> {
        match self {
            RelationValue::One(value) => value.as_ref(),
            RelationValue::Many(_) => None,
        }
    }

    /// The collection, if this is a multi-valued relation
    pub fn as_many(&self) -> Option<&[R]> {
        match self {
            RelationValue::One(_) => None,
            RelationValue::Many(values) => Some(values),
        }
    }

    /// Flatten into a vector regardless of cardinality
    pub fn into_vec(self) -> Vec<R> {
        match self {
            RelationValue::One(value) => value.into_iter().collect(),
            RelationValue::Many(values) => values,
        }
    }
}

/// Cardinality and target type recorded for a relation name, as read from
/// the first bridge record.
///
/// `target_type` is the raw tag from storage; it is not checked against the
/// morph map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSignature {
    pub relation: String,
    pub cardinality: Cardinality,
    pub target_type: String,
}

/// What a dynamic relation name resolves to for an owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub name: String,
    pub cardinality: Cardinality,
    pub target: MorphType,
}

/// Result of the two-step relation dispatch
#[derive(Debug)]
pub enum RelationLookup<R> {
    /// A statically declared relation of the owner type
    Static(&'static str),
    /// A relation synthesized from bridge records
    Dynamic(super::resolver::DynamicRelationship<R>),
    /// Neither static nor dynamic
    Unknown(String),
}

impl<R> RelationLookup<R> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, RelationLookup::Unknown(_))
    }
}

/// Validate a name for use as a dynamic relation
pub(crate) fn is_usable_relation_name(name: &str) -> bool {
    !name.trim().is_empty() && name != RESERVED_RELATION_NAME
}
