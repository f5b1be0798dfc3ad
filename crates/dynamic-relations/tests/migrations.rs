mod common;

use common::*;
use elif_dynamic_relations::migrations::{MigrationRunner, MigrationStatus};
use elif_dynamic_relations::prelude::*;

#[tokio::test]
async fn test_bridge_migration_applies_once_and_rolls_back() {
    init_tracing();
    let pool = connect("sqlite::memory:", DatabasePoolConfig::in_memory()).await.unwrap();
    let relations = DynamicRelations::with_config(
        pool.clone(),
        DynamicRelationsConfig::default().with_bridge_table("page_links"),
    )
    .unwrap();

    let first = relations.migrate().await.unwrap();
    assert_eq!(first.applied_count(), 1);
    assert_eq!(first.batch, Some(1));

    let second = relations.migrate().await.unwrap();
    assert_eq!(second.applied_count(), 0);
    assert_eq!(second.skipped_count, 1);

    let runner = MigrationRunner::new(pool.clone());
    let migrations = [relations.migration()];
    let status = runner.status(&migrations).await.unwrap();
    assert!(matches!(status[0].1, MigrationStatus::Applied { batch: 1, .. }));

    // The configured table is the one created
    let count: i64 = relations
        .store()
        .count_by_owner(&elif_dynamic_relations::ModelRef::new(
            relations.register_model::<Page>(),
            1,
        ))
        .await
        .unwrap();
    assert_eq!(count, 0);

    let rolled_back = runner.rollback_last_batch(&migrations).await.unwrap();
    assert_eq!(rolled_back.rolled_back_migrations.len(), 1);
    assert!(pool.execute("SELECT id FROM page_links", &[]).await.is_err());

    let status = runner.status(&migrations).await.unwrap();
    assert_eq!(status[0].1, MigrationStatus::Pending);
}
