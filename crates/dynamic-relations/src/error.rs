//! Error types for the dynamic relations system
//!
//! Provides error handling for storage access, model mapping, query
//! building and dynamic relationship resolution.

use std::fmt;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Database connection or query error
    Database(String),
    /// Model not found in database
    NotFound(String),
    /// Model or identifier validation failed
    Validation(String),
    /// Primary key is missing or invalid
    MissingPrimaryKey,
    /// Relationship resolution or mutation failed
    Relationship(RelationshipError),
    /// Serialization/deserialization error
    Serialization(String),
    /// Migration error
    Migration(String),
    /// Connection pool error
    Connection(String),
    /// Query building or execution error
    Query(String),
    /// Configuration error
    Configuration(String),
    /// A column requested from a row does not exist
    ColumnNotFound(String),
    /// A morph type tag that no registered model claims
    UnknownMorphType(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::NotFound(table) => write!(f, "Record not found in table '{}'", table),
            ModelError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ModelError::MissingPrimaryKey => write!(f, "Primary key is missing or invalid"),
            ModelError::Relationship(err) => write!(f, "Relationship error: {}", err),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Migration(msg) => write!(f, "Migration error: {}", msg),
            ModelError::Connection(msg) => write!(f, "Connection error: {}", msg),
            ModelError::Query(msg) => write!(f, "Query error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ModelError::ColumnNotFound(column) => write!(f, "Column '{}' not found", column),
            ModelError::UnknownMorphType(tag) => write!(f, "Unknown morph type '{}'", tag),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Relationship(err) => Some(err),
            _ => None,
        }
    }
}

impl ModelError {
    /// True when this error is the "no such relation" condition
    pub fn is_unknown_relation(&self) -> bool {
        matches!(self, ModelError::Relationship(RelationshipError::NotFound { .. }))
    }
}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnNotFound(column) => ModelError::ColumnNotFound(column),
            sqlx::Error::RowNotFound => ModelError::NotFound("row".to_string()),
            pool_err @ (sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) => {
                ModelError::Connection(pool_err.to_string())
            }
            other => ModelError::Database(other.to_string()),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

/// Error types for dynamic relationship operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelationshipError {
    /// Neither a static nor a dynamic relation with this name exists
    #[error("relation '{relation}' is not defined on '{model}'")]
    NotFound { model: String, relation: String },

    /// The name is a statically declared relation, not a dynamic one
    #[error("relation '{relation}' on '{model}' is statically declared")]
    StaticRelation { model: String, relation: String },

    /// The relation name cannot be used for a dynamic relation
    #[error("invalid relation name '{0}'")]
    InvalidName(String),

    /// Attach disagrees with the cardinality already recorded for the name
    #[error("relation '{relation}' on '{model}' is recorded as {recorded}, refusing to attach as {requested}")]
    CardinalityConflict {
        model: String,
        relation: String,
        recorded: String,
        requested: String,
    },

    /// Attach disagrees with the target type already recorded for the name
    #[error("relation '{relation}' on '{model}' targets '{recorded}', refusing to attach '{requested}'")]
    TargetTypeConflict {
        model: String,
        relation: String,
        recorded: String,
        requested: String,
    },

    /// The relation was resolved for a model type other than the recorded target
    #[error("relation '{relation}' resolves to '{recorded}', not '{requested}'")]
    TypeMismatch {
        relation: String,
        recorded: String,
        requested: String,
    },
}

impl From<RelationshipError> for ModelError {
    fn from(err: RelationshipError) -> Self {
        ModelError::Relationship(err)
    }
}

/// Error types for migration operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum MigrationError {
    /// Migration statement failed
    #[error("migration {id} failed: {message}")]
    StatementFailed { id: String, message: String },

    /// A recorded migration has no definition to roll back with
    #[error("migration {0} is recorded as applied but has no definition")]
    UnknownMigration(String),
}

impl From<MigrationError> for ModelError {
    fn from(err: MigrationError) -> Self {
        ModelError::Migration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_relation_is_detectable() {
        let err: ModelError = RelationshipError::NotFound {
            model: "pages".to_string(),
            relation: "article".to_string(),
        }
        .into();

        assert!(err.is_unknown_relation());
        assert_eq!(
            err.to_string(),
            "Relationship error: relation 'article' is not defined on 'pages'"
        );
        assert!(!ModelError::MissingPrimaryKey.is_unknown_relation());
    }

    #[test]
    fn test_sqlx_column_not_found_maps_to_column_error() {
        let err: ModelError = sqlx::Error::ColumnNotFound("title".to_string()).into();
        assert!(matches!(err, ModelError::ColumnNotFound(ref c) if c == "title"));
    }
}
