mod common;

use common::*;
use elif_dynamic_relations::prelude::*;
use elif_dynamic_relations::relationships::SELF_TARGET_ALIAS;
use elif_dynamic_relations::ModelRef;

#[tokio::test]
async fn test_load_dynamic_groups_targets_per_owner() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let about = page(&relations, "About").await;
    let blank = page(&relations, "Blank").await;
    let first = article(&relations, "First").await;
    let second = article(&relations, "Second").await;
    let third = article(&relations, "Third").await;

    home.attach(&relations, "related", vec![&second, &first]).await.unwrap();
    about.attach(&relations, "related", vec![&third]).await.unwrap();

    let owners = vec![home.clone(), about.clone(), blank.clone()];
    let loaded = relations
        .load_dynamic::<Page, Article>(&owners, "related")
        .await
        .unwrap();

    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[&home.id.unwrap()], RelationValue::Many(vec![second, first]));
    assert_eq!(loaded[&about.id.unwrap()], RelationValue::Many(vec![third]));
    assert_eq!(loaded[&blank.id.unwrap()], RelationValue::Many(Vec::new()));
}

#[tokio::test]
async fn test_load_dynamic_collapses_singular_relations() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let about = page(&relations, "About").await;
    let older = article(&relations, "Older").await;
    let newer = article(&relations, "Newer").await;

    home.attach(&relations, "featured", &older).await.unwrap();
    home.attach(&relations, "featured", &newer).await.unwrap();

    let loaded = relations
        .load_dynamic::<Page, Article>(&[home.clone(), about.clone()], "featured")
        .await
        .unwrap();

    assert_eq!(loaded[&home.id.unwrap()], RelationValue::One(Some(older)));
    assert_eq!(loaded[&about.id.unwrap()], RelationValue::One(None));
}

#[tokio::test]
async fn test_load_dynamic_of_unknown_relation_fails() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;

    let err = relations
        .load_dynamic::<Page, Article>(&[home], "missing")
        .await
        .unwrap_err();
    assert!(err.is_unknown_relation());
}

#[tokio::test]
async fn test_where_has_dynamic_filters_owners() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let about = page(&relations, "About").await;
    let _blank = page(&relations, "Blank").await;
    let rust = article(&relations, "Rust").await;
    let go = article(&relations, "Go").await;

    home.attach(&relations, "related", vec![&rust, &go]).await.unwrap();
    about.attach(&relations, "related", vec![&go]).await.unwrap();

    let with_related = relations
        .where_has_dynamic::<Page, Article, _>(Page::query().order_by("pages.id"), "related", |q| q)
        .unwrap()
        .get(pool(&relations))
        .await
        .unwrap();
    assert_eq!(with_related, vec![home.clone(), about.clone()]);

    let counted = relations
        .where_has_dynamic::<Page, Article, _>(Page::query(), "related", |q| q)
        .unwrap()
        .count(pool(&relations))
        .await
        .unwrap();
    assert_eq!(counted, with_related.len() as i64);

    let with_rust = relations
        .where_has_dynamic::<Page, Article, _>(Page::query(), "related", |q| {
            q.where_eq("articles.title", "Rust")
        })
        .unwrap()
        .get(pool(&relations))
        .await
        .unwrap();
    assert_eq!(with_rust, vec![home.clone()]);

    let without_rust = relations
        .where_doesnt_have_dynamic::<Page, Article, _>(Page::query().order_by("pages.id"), "related", |q| {
            q.where_eq("articles.title", "Rust")
        })
        .unwrap()
        .get(pool(&relations))
        .await
        .unwrap();
    assert_eq!(without_rust.len(), 2);
    assert!(!without_rust.contains(&home));

    let at_least_two = relations
        .where_has_dynamic_count::<Page, Article, _>(
            Page::query(),
            "related",
            |q| q,
            QueryOperator::GreaterThanOrEqual,
            2,
        )
        .unwrap()
        .get(pool(&relations))
        .await
        .unwrap();
    assert_eq!(at_least_two, vec![home]);
}

#[tokio::test]
async fn test_where_has_dynamic_on_self_referencing_relation() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let about = page(&relations, "About").await;
    let blank = page(&relations, "Blank").await;

    home.attach(&relations, "related", vec![&about]).await.unwrap();

    let with_related = relations
        .where_has_dynamic::<Page, Page, _>(Page::query(), "related", |q| q)
        .unwrap()
        .get(pool(&relations))
        .await
        .unwrap();
    assert_eq!(with_related, vec![home.clone()]);

    let alias_column = format!("{}.title", SELF_TARGET_ALIAS);
    let related_to_blank = relations
        .where_has_dynamic::<Page, Page, _>(Page::query(), "related", |q| q.where_eq(&alias_column, "Blank"))
        .unwrap()
        .get(pool(&relations))
        .await
        .unwrap();
    assert!(related_to_blank.is_empty());

    let without_related = relations
        .where_doesnt_have_dynamic::<Page, Page, _>(Page::query().order_by("pages.id"), "related", |q| q)
        .unwrap()
        .get(pool(&relations))
        .await
        .unwrap();
    assert_eq!(without_related, vec![about, blank]);

    let counted = relations
        .where_has_dynamic_count::<Page, Page, _>(Page::query(), "related", |q| q, QueryOperator::Equal, 1)
        .unwrap()
        .count(pool(&relations))
        .await
        .unwrap();
    assert_eq!(counted, 1);
}

#[tokio::test]
async fn test_where_has_dynamic_rejects_reserved_name() {
    let relations = setup().await;

    let result = relations.where_has_dynamic::<Page, Article, _>(
        Page::query(),
        elif_dynamic_relations::relationships::RESERVED_RELATION_NAME,
        |q| q,
    );
    assert!(matches!(
        result,
        Err(ModelError::Relationship(RelationshipError::InvalidName(_)))
    ));
}

#[tokio::test]
async fn test_purge_owner_and_target() {
    let relations = setup().await;
    let home = page(&relations, "Home").await;
    let about = page(&relations, "About").await;
    let first = article(&relations, "First").await;
    let second = article(&relations, "Second").await;

    home.attach(&relations, "related", vec![&first, &second]).await.unwrap();
    about.attach(&relations, "related", vec![&first]).await.unwrap();

    let purged = relations.purge_target(&first).await.unwrap();
    assert_eq!(purged, 2);

    let value = home.relation_value::<Article>(&relations, "related").await.unwrap();
    assert_eq!(value, RelationValue::Many(vec![second]));

    let purged = home.purge_dynamic_relations(&relations).await.unwrap();
    assert_eq!(purged, 1);
    assert!(home.dynamic_relations(&relations).await.unwrap().is_empty());
    assert_eq!(relations.store().count_by_owner(&ModelRef::of(&about).unwrap()).await.unwrap(), 0);
}
