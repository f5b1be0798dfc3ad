//! Dynamic relations configuration
//!
//! Bridge table naming and the policies applied by `attach`. Every field
//! has a default matching the stock migration, and each can be overridden
//! from the environment.

use std::str::FromStr;

use crate::error::{ModelError, ModelResult};
use crate::security::validate_identifier;

/// Default bridge table name
pub const DEFAULT_BRIDGE_TABLE: &str = "dynamic_relations";

/// Environment variable overriding the bridge table name
pub const ENV_BRIDGE_TABLE: &str = "ELIF_DYNAMIC_RELATIONS_TABLE";

/// Environment variable selecting the consistency policy
pub const ENV_CONSISTENCY: &str = "ELIF_DYNAMIC_RELATIONS_CONSISTENCY";

/// Environment variable selecting the duplicate edge policy
pub const ENV_DUPLICATES: &str = "ELIF_DYNAMIC_RELATIONS_DUPLICATES";

/// How `attach` treats a relation name whose recorded cardinality or
/// target type differs from the one being attached.
///
/// The first bridge record (lowest id) for the owner type and relation
/// name is the recorded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsistencyPolicy {
    /// Refuse the attach with a relationship error
    #[default]
    Reject,
    /// Store the new edges with the recorded cardinality; a differing
    /// target type is still refused
    Coerce,
    /// Store whatever is attached, as the bridge table always allowed.
    /// Each owner's own first record then defines its relation's shape.
    Permissive,
}

impl FromStr for ConsistencyPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" | "strict" => Ok(Self::Reject),
            "coerce" => Ok(Self::Coerce),
            "permissive" | "off" => Ok(Self::Permissive),
            other => Err(ModelError::Configuration(format!(
                "Unknown consistency policy '{}'",
                other
            ))),
        }
    }
}

/// Whether attaching an already existing (owner, relation, target) edge
/// creates another bridge record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateEdgePolicy {
    /// Every attach inserts, duplicate edges duplicate results
    #[default]
    Allow,
    /// Existing edges are left alone
    Skip,
}

impl FromStr for DuplicateEdgePolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "skip" | "ignore" => Ok(Self::Skip),
            other => Err(ModelError::Configuration(format!(
                "Unknown duplicate edge policy '{}'",
                other
            ))),
        }
    }
}

/// Configuration for the dynamic relations service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicRelationsConfig {
    /// Table holding bridge records
    pub bridge_table: String,
    /// Cardinality and target type policy applied on attach
    pub consistency: ConsistencyPolicy,
    /// Duplicate edge policy applied on attach
    pub duplicates: DuplicateEdgePolicy,
}

impl Default for DynamicRelationsConfig {
    fn default() -> Self {
        Self {
            bridge_table: DEFAULT_BRIDGE_TABLE.to_string(),
            consistency: ConsistencyPolicy::default(),
            duplicates: DuplicateEdgePolicy::default(),
        }
    }
}

impl DynamicRelationsConfig {
    /// Set the bridge table name
    pub fn with_bridge_table(mut self, table: impl Into<String>) -> Self {
        self.bridge_table = table.into();
        self
    }

    /// Set the consistency policy
    pub fn with_consistency(mut self, policy: ConsistencyPolicy) -> Self {
        self.consistency = policy;
        self
    }

    /// Set the duplicate edge policy
    pub fn with_duplicates(mut self, policy: DuplicateEdgePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Build a configuration from `ELIF_DYNAMIC_RELATIONS_*` variables,
    /// falling back to defaults for unset ones.
    pub fn from_env() -> ModelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> ModelResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(table) = lookup(ENV_BRIDGE_TABLE) {
            config.bridge_table = table;
        }
        if let Some(policy) = lookup(ENV_CONSISTENCY) {
            config.consistency = policy.parse()?;
        }
        if let Some(policy) = lookup(ENV_DUPLICATES) {
            config.duplicates = policy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configured identifiers
    pub fn validate(&self) -> ModelResult<()> {
        validate_identifier(&self.bridge_table).map_err(|e| {
            ModelError::Configuration(format!("Invalid bridge table name: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_stock_migration() {
        let config = DynamicRelationsConfig::default();
        assert_eq!(config.bridge_table, "dynamic_relations");
        assert_eq!(config.consistency, ConsistencyPolicy::Reject);
        assert_eq!(config.duplicates, DuplicateEdgePolicy::Allow);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BRIDGE_TABLE, "page_links"),
            (ENV_CONSISTENCY, "coerce"),
            (ENV_DUPLICATES, "skip"),
        ]
        .into_iter()
        .collect();

        let config =
            DynamicRelationsConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.bridge_table, "page_links");
        assert_eq!(config.consistency, ConsistencyPolicy::Coerce);
        assert_eq!(config.duplicates, DuplicateEdgePolicy::Skip);
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        let bad_table = DynamicRelationsConfig::from_lookup(|key| {
            (key == ENV_BRIDGE_TABLE).then(|| "links; drop".to_string())
        });
        assert!(matches!(bad_table, Err(ModelError::Configuration(_))));

        let bad_policy = DynamicRelationsConfig::from_lookup(|key| {
            (key == ENV_CONSISTENCY).then(|| "sometimes".to_string())
        });
        assert!(matches!(bad_policy, Err(ModelError::Configuration(_))));
    }
}
