mod common;

use common::*;
use elif_dynamic_relations::prelude::*;
use elif_dynamic_relations::relationships::{Cardinality, RegisteredRelation};
use elif_dynamic_relations::ModelRef;

async fn file_pool(path: &std::path::Path) -> std::sync::Arc<dyn DatabasePool> {
    let url = format!("sqlite://{}", path.display());
    connect(&url, DatabasePoolConfig::default()).await.unwrap()
}

#[tokio::test]
async fn test_names_recorded_elsewhere_are_discovered_on_first_use() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relations.db");

    // First process: records relations for pages
    let writer = {
        let pool = file_pool(&path).await;
        create_fixture_tables(pool.as_ref()).await.unwrap();
        let relations = shared(pool);
        relations.migrate().await.unwrap();
        relations
    };
    let home = page(&writer, "Home").await;
    let intro = article(&writer, "Intro").await;
    let first = article(&writer, "First").await;
    home.attach(&writer, "article", &intro).await.unwrap();
    home.attach(&writer, "related", vec![&first]).await.unwrap();
    writer.pool().close().await.unwrap();

    // Second process: fresh registry over the same database
    let reader = shared(file_pool(&path).await);
    reader.register_model::<Article>();
    assert!(!reader.registry().is_discovered::<Page>());

    let blank = page(&reader, "Blank").await;
    let value = blank.relation_value::<Article>(&reader, "related").await.unwrap();
    assert_eq!(value, RelationValue::Many(Vec::new()));

    assert!(reader.registry().is_discovered::<Page>());
    assert_eq!(reader.registry().names::<Page>(), vec!["article".to_string(), "related".to_string()]);
    assert_eq!(
        reader.registry().lookup::<Page>("article"),
        Some(RegisteredRelation {
            cardinality: Cardinality::One,
            target_type: "articles".to_string(),
        })
    );

    let resolved = home.relation_value::<Article>(&reader, "article").await.unwrap();
    assert_eq!(resolved, RelationValue::One(Some(intro)));
}

#[tokio::test]
async fn test_discovery_runs_once_per_type() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let intro = article(&relations, "Intro").await;

    relations.registry().ensure_registered::<Page>(relations.store()).await.unwrap();
    assert!(relations.registry().names::<Page>().is_empty());

    // Recorded directly in storage, bypassing attach and the registry
    let owner = ModelRef::of(&home).unwrap();
    let target = ModelRef::of(&intro).unwrap();
    relations
        .store()
        .create("sideloaded", Cardinality::One, &owner, &target)
        .await
        .unwrap();

    relations.registry().ensure_registered::<Page>(relations.store()).await.unwrap();
    assert!(!relations.registry().contains::<Page>("sideloaded"));

    // Per-instance fallback still finds it, and registers it
    assert!(home.has_dynamic_relation(&relations, "sideloaded").await.unwrap());
    let value = home.relation_value::<Article>(&relations, "sideloaded").await.unwrap();
    assert_eq!(value.as_one(), Some(&intro));
    assert!(relations.registry().contains::<Page>("sideloaded"));
}

#[tokio::test]
async fn test_first_registration_wins() {
    let relations = setup().await;
    let one = RegisteredRelation {
        cardinality: Cardinality::One,
        target_type: "articles".to_string(),
    };
    let many = RegisteredRelation {
        cardinality: Cardinality::Many,
        target_type: "articles".to_string(),
    };

    assert!(relations.registry().register::<Page>("article", one.clone()));
    assert!(!relations.registry().register::<Page>("article", many));
    assert_eq!(relations.registry().lookup::<Page>("article"), Some(one));

    // Registries are per type
    assert!(relations.registry().lookup::<Article>("article").is_none());
}

#[tokio::test]
async fn test_concurrent_first_use_discovers_once() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let intro = article(&relations, "Intro").await;
    home.attach(&relations, "article", &intro).await.unwrap();

    let fresh = shared(relations.pool().clone());
    let registry = fresh.registry();
    let store = fresh.store();

    let (a, b) = tokio::join!(
        registry.ensure_registered::<Page>(store),
        registry.ensure_registered::<Page>(store)
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(registry.names::<Page>(), vec!["article".to_string()]);
}
