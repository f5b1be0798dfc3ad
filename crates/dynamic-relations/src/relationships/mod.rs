//! Dynamic Relationships
//!
//! Relations between models recorded as rows of a bridge table and resolved
//! at runtime as has-one/has-many-through joins.
//!
//! - `bridge` / `store`: bridge records and their persistence
//! - `resolver`: through-join relationships of one owner
//! - `registrar`: per-type registry of discovered relation names
//! - `dynamic` / `capability`: the service and the owner-side trait
//! - `eager`: batched loading and existence constraints
//! - `loader`: lazy loading wrapper

pub mod bridge;
pub mod capability;
pub mod dynamic;
pub mod eager;
pub mod loader;
pub mod morph;
pub mod registrar;
pub mod resolver;
pub mod store;
pub mod types;

pub use bridge::DynamicRelationRecord;
pub use capability::{HasDynamicRelations, Targets};
pub use dynamic::DynamicRelations;
pub use loader::{Lazy, RelationshipLoader};
pub use morph::{ModelRef, MorphMap, MorphType};
pub use registrar::{RegisteredRelation, RelationRegistry};
pub use resolver::{DynamicRelationship, SELF_TARGET_ALIAS};
pub use store::BridgeStore;
pub use types::{
    Cardinality, RelationDescriptor, RelationLookup, RelationSignature, RelationValue,
    RESERVED_RELATION_NAME,
};
