//! # elif-dynamic-relations
//!
//! Runtime-defined relations between models for the elif.rs database layer.
//!
//! An owner model attaches other models under a relation name; each edge is
//! stored as a row of a bridge table. The name then resolves like a declared
//! relation: a has-one or has-many-through join from the owner, over the
//! bridge, to the target table. Statically declared relations always win
//! over dynamic ones of the same name.
//!
//! ```no_run
//! # use elif_dynamic_relations::prelude::*;
//! # async fn demo<P: HasDynamicRelations, A: Model<PrimaryKey = i64> + 'static>(page: P, article: A) -> ModelResult<()> {
//! let relations = bootstrap("sqlite::memory:", DatabasePoolConfig::in_memory(), DynamicRelationsConfig::default()).await?;
//!
//! page.attach(&relations, "article", &article).await?;
//! let value = page.relation_value::<A>(&relations, "article").await?;
//! assert_eq!(value.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod database;
pub mod error;
pub mod migrations;
pub mod model;
pub mod query;
pub mod relationships;
pub mod security;

// Re-export core traits and types
pub use backends::{DatabasePool, DatabasePoolConfig, DatabaseRow, DatabaseRowExt, DatabaseValue, SqlDialect};
pub use config::{ConsistencyPolicy, DuplicateEdgePolicy, DynamicRelationsConfig};
pub use database::{bootstrap, connect};
pub use error::{MigrationError, ModelError, ModelResult, OrmError, OrmResult, RelationshipError};
pub use model::{CrudOperations, Model};
pub use query::{QueryBuilder, QueryOperator};
pub use relationships::{
    BridgeStore, Cardinality, DynamicRelationRecord, DynamicRelations, DynamicRelationship,
    HasDynamicRelations, Lazy, ModelRef, MorphType, RelationDescriptor, RelationLookup, RelationValue,
    Targets,
};

/// Everything needed to declare owner models and use dynamic relations
pub mod prelude {
    pub use crate::backends::{DatabasePool, DatabasePoolConfig, DatabaseRow, DatabaseRowExt, DatabaseValue};
    pub use crate::config::{ConsistencyPolicy, DuplicateEdgePolicy, DynamicRelationsConfig};
    pub use crate::database::{bootstrap, connect};
    pub use crate::error::{ModelError, ModelResult, RelationshipError};
    pub use crate::model::{CrudOperations, Model};
    pub use crate::query::{QueryBuilder, QueryOperator};
    pub use crate::relationships::{
        Cardinality, DynamicRelations, DynamicRelationship, HasDynamicRelations, RelationLookup,
        RelationValue, Targets,
    };
}
