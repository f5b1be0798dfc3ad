//! Migration Runner - Executes migrations against the database
//!
//! Tracks applied migrations in a table and groups each run into a batch,
//! so the most recent batch can be rolled back.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::definitions::{Migration, MigrationRecord, MigrationRunResult, MigrationStatus, RollbackResult};
use crate::backends::{DatabasePool, DatabaseRowExt, DatabaseValue};
use crate::error::{MigrationError, OrmError, OrmResult};

/// Default table for tracking applied migrations
pub const DEFAULT_MIGRATIONS_TABLE: &str = "elif_migrations";

/// Migration runner that executes migrations against a database
pub struct MigrationRunner {
    pool: Arc<dyn DatabasePool>,
    migrations_table: String,
}

impl MigrationRunner {
    /// Create a new migration runner using the default tracking table
    pub fn new(pool: Arc<dyn DatabasePool>) -> Self {
        Self {
            pool,
            migrations_table: DEFAULT_MIGRATIONS_TABLE.to_string(),
        }
    }

    /// Get the database pool
    pub fn pool(&self) -> &Arc<dyn DatabasePool> {
        &self.pool
    }

    /// Apply every migration that is not yet recorded, in the given order
    pub async fn run(&self, migrations: &[Migration]) -> OrmResult<MigrationRunResult> {
        self.ensure_migrations_table().await?;

        let applied_ids: HashSet<String> = self
            .applied_migrations()
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| !applied_ids.contains(&m.id))
            .collect();
        let skipped_count = migrations.len() - pending.len();

        if pending.is_empty() {
            tracing::debug!("No pending migrations");
            return Ok(MigrationRunResult {
                applied_migrations: Vec::new(),
                skipped_count,
                batch: None,
            });
        }

        let batch = self.next_batch_number().await?;
        let mut applied_migrations = Vec::with_capacity(pending.len());

        for migration in pending {
            tracing::info!("Applying migration: {} - {}", migration.id, migration.name);
            self.execute_statements(&migration.id, &migration.up).await?;
            self.record_migration(&migration.id, batch).await?;
            applied_migrations.push(migration.id.clone());
        }

        Ok(MigrationRunResult {
            applied_migrations,
            skipped_count,
            batch: Some(batch),
        })
    }

    /// Revert the migrations of the latest batch, newest first
    pub async fn rollback_last_batch(&self, migrations: &[Migration]) -> OrmResult<RollbackResult> {
        self.ensure_migrations_table().await?;

        let records = self.applied_migrations().await?;
        let Some(latest) = records.iter().map(|r| r.batch).max() else {
            return Ok(RollbackResult {
                rolled_back_migrations: Vec::new(),
            });
        };

        let by_id: HashMap<&str, &Migration> = migrations.iter().map(|m| (m.id.as_str(), m)).collect();
        let mut rolled_back_migrations = Vec::new();

        // Records come back newest first
        for record in records.iter().filter(|r| r.batch == latest) {
            let migration = by_id
                .get(record.id.as_str())
                .ok_or_else(|| MigrationError::UnknownMigration(record.id.clone()))?;

            tracing::info!("Rolling back migration: {} - {}", migration.id, migration.name);
            self.execute_statements(&migration.id, &migration.down).await?;
            self.forget_migration(&migration.id).await?;
            rolled_back_migrations.push(migration.id.clone());
        }

        Ok(RollbackResult { rolled_back_migrations })
    }

    /// Status of each given migration
    pub async fn status(&self, migrations: &[Migration]) -> OrmResult<Vec<(String, MigrationStatus)>> {
        self.ensure_migrations_table().await?;

        let applied: HashMap<String, MigrationRecord> = self
            .applied_migrations()
            .await?
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();

        Ok(migrations
            .iter()
            .map(|m| {
                let status = match applied.get(&m.id) {
                    Some(record) => MigrationStatus::Applied {
                        applied_at: record.applied_at,
                        batch: record.batch,
                    },
                    None => MigrationStatus::Pending,
                };
                (m.id.clone(), status)
            })
            .collect())
    }

    /// Applied migrations, newest batch first
    pub async fn applied_migrations(&self) -> OrmResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT id, applied_at, batch FROM {} ORDER BY batch DESC, applied_at DESC, id DESC",
            self.migrations_table
        );
        let rows = self.pool.fetch_all(&sql, &[]).await.map_err(|e| {
            OrmError::Migration(format!("Failed to query applied migrations: {}", e))
        })?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(MigrationRecord {
                id: row.get("id")?,
                applied_at: row.get("applied_at")?,
                batch: row.get_i64("batch")? as i32,
            });
        }

        Ok(records)
    }

    async fn execute_statements(&self, migration_id: &str, statements: &[String]) -> OrmResult<()> {
        for statement in statements.iter().filter(|s| !s.trim().is_empty()) {
            self.pool.execute(statement, &[]).await.map_err(|e| MigrationError::StatementFailed {
                id: migration_id.to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    async fn ensure_migrations_table(&self) -> OrmResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                id VARCHAR(255) PRIMARY KEY,\n    \
                applied_at {} NOT NULL,\n    \
                batch INTEGER NOT NULL\n\
            )",
            self.migrations_table,
            self.pool.dialect().timestamp_type()
        );
        self.pool.execute(&sql, &[]).await.map_err(|e| {
            OrmError::Migration(format!("Failed to create migrations table: {}", e))
        })?;
        Ok(())
    }

    async fn next_batch_number(&self) -> OrmResult<i32> {
        let sql = format!(
            "SELECT COALESCE(MAX(batch), 0) AS batch FROM {}",
            self.migrations_table
        );
        let latest = match self.pool.fetch_optional(&sql, &[]).await? {
            Some(row) => row.get_i64("batch")?,
            None => 0,
        };
        Ok(latest as i32 + 1)
    }

    async fn record_migration(&self, migration_id: &str, batch: i32) -> OrmResult<()> {
        let dialect = self.pool.dialect();
        let sql = format!(
            "INSERT INTO {} (id, applied_at, batch) VALUES ({}, {}, {})",
            self.migrations_table,
            dialect.parameter_placeholder(0),
            dialect.parameter_placeholder(1),
            dialect.parameter_placeholder(2),
        );
        let params = [
            DatabaseValue::from(migration_id),
            DatabaseValue::from(chrono::Utc::now()),
            DatabaseValue::from(batch),
        ];
        self.pool.execute(&sql, &params).await.map_err(|e| {
            OrmError::Migration(format!("Failed to record migration: {}", e))
        })?;
        Ok(())
    }

    async fn forget_migration(&self, migration_id: &str) -> OrmResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE id = {}",
            self.migrations_table,
            self.pool.dialect().parameter_placeholder(0)
        );
        self.pool.execute(&sql, &[DatabaseValue::from(migration_id)]).await?;
        Ok(())
    }
}
