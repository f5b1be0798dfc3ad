//! Migration Definitions - Core types and structures for migrations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a database migration rendered for one dialect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    /// Unique identifier for the migration (typically timestamp-prefixed)
    pub id: String,
    /// Human-readable name for the migration
    pub name: String,
    /// Statements applying the migration, executed in order
    pub up: Vec<String>,
    /// Statements reverting the migration, executed in order
    pub down: Vec<String>,
}

/// Migration status in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Migration ID
    pub id: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
    /// Batch number (for grouping migrations)
    pub batch: i32,
}

/// Result of running migrations
#[derive(Debug)]
pub struct MigrationRunResult {
    /// IDs of migrations that were applied
    pub applied_migrations: Vec<String>,
    /// Number of migrations that were skipped (already applied)
    pub skipped_count: usize,
    /// Batch the applied migrations were recorded under
    pub batch: Option<i32>,
}

impl MigrationRunResult {
    /// Number of migrations that were applied
    pub fn applied_count(&self) -> usize {
        self.applied_migrations.len()
    }
}

/// Result of rolling back migrations
#[derive(Debug)]
pub struct RollbackResult {
    /// IDs of migrations that were rolled back
    pub rolled_back_migrations: Vec<String>,
}

/// Migration status in the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Migration is pending (not yet applied)
    Pending,
    /// Migration has been applied
    Applied {
        /// When it was applied
        applied_at: DateTime<Utc>,
        /// Batch number
        batch: i32,
    },
}
