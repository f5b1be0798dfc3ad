//! Database connectivity
//!
//! Opens a pool for a database URL through the backend registry and wires
//! the dynamic relations service on top of it.

use std::sync::Arc;

use crate::backends::{DatabaseBackendRegistry, DatabasePool, DatabasePoolConfig};
use crate::config::DynamicRelationsConfig;
use crate::error::ModelResult;
use crate::relationships::DynamicRelations;

/// Open a pool for `database_url`; the backend is chosen from the URL scheme
pub async fn connect(database_url: &str, config: DatabasePoolConfig) -> ModelResult<Arc<dyn DatabasePool>> {
    let backend = DatabaseBackendRegistry::detect_backend_from_url(database_url)?;
    tracing::info!(%backend, max_connections = config.max_connections, "connecting to database");

    DatabaseBackendRegistry::with_defaults()
        .create_pool(database_url, config)
        .await
}

/// Open a pool, create the bridge table when missing and return the
/// dynamic relations service over it
pub async fn bootstrap(
    database_url: &str,
    pool_config: DatabasePoolConfig,
    config: DynamicRelationsConfig,
) -> ModelResult<DynamicRelations> {
    let pool = connect(database_url, pool_config).await?;
    let relations = DynamicRelations::with_config(pool, config)?;

    let migrated = relations.migrate().await?;
    if migrated.applied_count() > 0 {
        tracing::info!(table = %relations.config().bridge_table, "created bridge table");
    }

    Ok(relations)
}
