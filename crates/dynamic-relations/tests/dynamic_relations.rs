mod common;

use common::*;
use elif_dynamic_relations::prelude::*;
use elif_dynamic_relations::relationships::RESERVED_RELATION_NAME;

#[tokio::test]
async fn test_attach_single_target_resolves_to_one() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let intro = article(&relations, "Intro").await;

    home.attach(&relations, "article", &intro).await.unwrap();

    assert!(home.has_dynamic_relation(&relations, "article").await.unwrap());
    assert!(!home.is_dynamic_relation_many(&relations, "article").await.unwrap());

    let value = home.relation_value::<Article>(&relations, "article").await.unwrap();
    assert_eq!(value, RelationValue::One(Some(intro)));
}

#[tokio::test]
async fn test_attach_collection_resolves_to_many_in_attach_order() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let first = article(&relations, "First").await;
    let second = article(&relations, "Second").await;
    let third = article(&relations, "Third").await;

    home.attach(&relations, "related", vec![&third, &first, &second])
        .await
        .unwrap();

    assert!(home.is_dynamic_relation_many(&relations, "related").await.unwrap());

    let value = home.relation_value::<Article>(&relations, "related").await.unwrap();
    assert_eq!(value, RelationValue::Many(vec![third, first, second]));
}

#[tokio::test]
async fn test_one_relation_with_several_edges_yields_oldest() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let older = article(&relations, "Older").await;
    let newer = article(&relations, "Newer").await;

    home.attach(&relations, "featured", &older).await.unwrap();
    home.attach(&relations, "featured", &newer).await.unwrap();

    let relationship = home.relation::<Article>(&relations, "featured").await.unwrap();
    assert_eq!(relationship.cardinality(), Cardinality::One);
    assert_eq!(relationship.count(pool(&relations)).await.unwrap(), 2);

    let value = relationship.get_results(pool(&relations)).await.unwrap();
    assert_eq!(value.as_one(), Some(&older));
}

#[tokio::test]
async fn test_relations_are_scoped_to_the_owner() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let about = page(&relations, "About").await;
    let intro = article(&relations, "Intro").await;
    let team = article(&relations, "Team").await;

    home.attach(&relations, "article", &intro).await.unwrap();
    about.attach(&relations, "article", &team).await.unwrap();

    let home_article = home.relation_value::<Article>(&relations, "article").await.unwrap();
    let about_article = about.relation_value::<Article>(&relations, "article").await.unwrap();

    assert_eq!(home_article.as_one(), Some(&intro));
    assert_eq!(about_article.as_one(), Some(&team));
}

#[tokio::test]
async fn test_registered_name_resolves_empty_for_owner_without_edges() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let blank = page(&relations, "Blank").await;
    let intro = article(&relations, "Intro").await;
    let first = article(&relations, "First").await;

    home.attach(&relations, "article", &intro).await.unwrap();
    home.attach(&relations, "related", vec![&first]).await.unwrap();

    assert!(!blank.has_dynamic_relation(&relations, "article").await.unwrap());

    let single = blank.relation_value::<Article>(&relations, "article").await.unwrap();
    assert_eq!(single, RelationValue::One(None));

    let many = blank.relation_value::<Article>(&relations, "related").await.unwrap();
    assert_eq!(many, RelationValue::Many(Vec::new()));
}

#[tokio::test]
async fn test_unknown_relation_resolves_to_unknown() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;

    let lookup = home.resolve_relation::<Article>(&relations, "missing").await.unwrap();
    assert!(matches!(lookup, RelationLookup::Unknown(ref name) if name == "missing"));

    assert!(!home.has_dynamic_relation(&relations, "missing").await.unwrap());
    assert!(!home.is_dynamic_relation_many(&relations, "missing").await.unwrap());

    let err = home.relation::<Article>(&relations, "missing").await.unwrap_err();
    assert!(err.is_unknown_relation());
}

#[tokio::test]
async fn test_static_relation_wins_over_dynamic_one() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let intro = article(&relations, "Intro").await;

    home.attach(&relations, "comments", &intro).await.unwrap();

    let lookup = home.resolve_relation::<Article>(&relations, "comments").await.unwrap();
    assert!(matches!(lookup, RelationLookup::Static("comments")));

    let err = home.relation::<Article>(&relations, "comments").await.unwrap_err();
    assert!(matches!(
        err,
        ModelError::Relationship(RelationshipError::StaticRelation { .. })
    ));
}

#[tokio::test]
async fn test_detach_removes_only_named_targets() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let first = article(&relations, "First").await;
    let second = article(&relations, "Second").await;

    home.attach(&relations, "related", vec![&first, &second]).await.unwrap();
    home.attach(&relations, "pinned", &first).await.unwrap();

    let removed = home.detach(&relations, "related", &first).await.unwrap();
    assert_eq!(removed, 1);

    let related = home.relation_value::<Article>(&relations, "related").await.unwrap();
    assert_eq!(related, RelationValue::Many(vec![second.clone()]));

    let pinned = home.relation_value::<Article>(&relations, "pinned").await.unwrap();
    assert_eq!(pinned.as_one(), Some(&first));

    let removed = home.detach(&relations, "related", vec![&second]).await.unwrap();
    assert_eq!(removed, 1);
    assert!(!home.has_dynamic_relation(&relations, "related").await.unwrap());
}

#[tokio::test]
async fn test_detach_of_unattached_target_is_a_noop() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let first = article(&relations, "First").await;

    let removed = home.detach(&relations, "related", &first).await.unwrap();
    assert_eq!(removed, 0);

    let removed = home.detach(&relations, "related", Vec::<&Article>::new()).await.unwrap();
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn test_reserved_name_is_rejected() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let intro = article(&relations, "Intro").await;

    let err = home
        .attach(&relations, RESERVED_RELATION_NAME, &intro)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::Relationship(RelationshipError::InvalidName(_))
    ));

    assert!(!home.has_dynamic_relation(&relations, RESERVED_RELATION_NAME).await.unwrap());
    assert!(home.dynamic_relations(&relations).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unsaved_models_cannot_be_attached() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let draft = Article {
        id: None,
        title: "Draft".to_string(),
        published: false,
    };

    let err = home.attach(&relations, "article", &draft).await.unwrap_err();
    assert!(matches!(err, ModelError::MissingPrimaryKey));

    let unsaved_owner = Page {
        id: None,
        title: "Unsaved".to_string(),
    };
    let intro = article(&relations, "Intro").await;
    let err = unsaved_owner.attach(&relations, "article", &intro).await.unwrap_err();
    assert!(matches!(err, ModelError::MissingPrimaryKey));
}

#[tokio::test]
async fn test_resolving_with_wrong_target_type_is_a_mismatch() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let intro = article(&relations, "Intro").await;

    home.attach(&relations, "article", &intro).await.unwrap();

    let err = home.relation_value::<Tag>(&relations, "article").await.unwrap_err();
    match err {
        ModelError::Relationship(RelationshipError::TypeMismatch { recorded, requested, .. }) => {
            assert_eq!(recorded, "articles");
            assert_eq!(requested, "tags");
        }
        other => panic!("expected type mismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_describe_and_raw_records() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let intro = article(&relations, "Intro").await;
    let first = article(&relations, "First").await;

    home.attach(&relations, "article", &intro).await.unwrap();
    home.attach(&relations, "related", vec![&first]).await.unwrap();

    let descriptor = home
        .describe_dynamic_relation(&relations, "related")
        .await
        .unwrap()
        .expect("descriptor");
    assert_eq!(descriptor.name, "related");
    assert_eq!(descriptor.cardinality, Cardinality::Many);
    assert_eq!(descriptor.target.as_str(), "articles");
    assert!(home.describe_dynamic_relation(&relations, "missing").await.unwrap().is_none());

    let records = home.dynamic_relations(&relations).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].relation, "article");
    assert!(!records[0].is_many);
    assert_eq!(records[0].owner.id, home.id.unwrap());
    assert_eq!(records[0].target.id, intro.id.unwrap());
    assert!(records[0].created_at.is_some());
    assert!(records[1].is_many);
}

#[tokio::test]
async fn test_relationship_constraints_and_lazy_loading() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let rust = article(&relations, "Rust").await;
    let go = article(&relations, "Go").await;

    home.attach(&relations, "related", vec![&rust, &go]).await.unwrap();

    let filtered = home
        .relation::<Article>(&relations, "related")
        .await
        .unwrap()
        .where_eq("title", "Go");
    assert_eq!(filtered.get(pool(&relations)).await.unwrap(), vec![go.clone()]);
    assert!(filtered.exists(pool(&relations)).await.unwrap());

    let mut lazy = home
        .relation::<Article>(&relations, "related")
        .await
        .unwrap()
        .lazy();
    assert!(!lazy.is_loaded());

    let loaded = lazy.get(pool(&relations)).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(lazy.is_loaded());

    lazy.clear();
    assert!(lazy.peek().is_none());
}

#[tokio::test]
async fn test_empty_collection_attach_records_nothing() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;

    home.attach(&relations, "related", Vec::<&Article>::new()).await.unwrap();

    assert!(!home.has_dynamic_relation(&relations, "related").await.unwrap());
    assert!(relations.registry().lookup::<Page>("related").is_none());
}

#[tokio::test]
async fn test_detaching_from_one_name_leaves_the_other_intact() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    for filler in ["Draft 1", "Draft 2", "Draft 3", "Draft 4"] {
        article(&relations, filler).await;
    }
    let fifth = article(&relations, "Fifth").await;
    let sixth = article(&relations, "Sixth").await;
    assert_eq!((home.id, fifth.id, sixth.id), (Some(1), Some(5), Some(6)));

    home.attach(&relations, "article", &fifth).await.unwrap();
    home.attach(&relations, "articles", vec![&fifth, &sixth]).await.unwrap();

    let removed = home.detach(&relations, "articles", &fifth).await.unwrap();
    assert_eq!(removed, 1);

    let articles = home.relation_value::<Article>(&relations, "articles").await.unwrap();
    assert_eq!(articles, RelationValue::Many(vec![sixth]));

    let single = home.relation_value::<Article>(&relations, "article").await.unwrap();
    assert_eq!(single, RelationValue::One(Some(fifth)));
}
