//! Shared fixtures: a few owner and target models over SQLite

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Once};

use elif_dynamic_relations::backends::SqlDialect;
use elif_dynamic_relations::migrations::SchemaBuilder;
use elif_dynamic_relations::prelude::*;
use serde::{Deserialize, Serialize};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: Option<i64>,
    pub title: String,
}

impl Model for Page {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "pages"
    }

    fn primary_key(&self) -> Option<i64> {
        self.id
    }

    fn set_primary_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn from_database_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.get("title")?,
        })
    }

    fn to_fields(&self) -> HashMap<String, DatabaseValue> {
        HashMap::from([("title".to_string(), self.title.clone().into())])
    }
}


impl HasDynamicRelations for Page {
    fn static_relations() -> &'static [&'static str] {
        &["comments"]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Option<i64>,
    pub title: String,
    pub published: bool,
}

impl Model for Article {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "articles"
    }

    fn primary_key(&self) -> Option<i64> {
        self.id
    }

    fn set_primary_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn from_database_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.get("title")?,
            published: row.get_bool("published")?,
        })
    }

    fn to_fields(&self) -> HashMap<String, DatabaseValue> {
        HashMap::from([
            ("title".to_string(), self.title.clone().into()),
            ("published".to_string(), self.published.into()),
        ])
    }
}


impl HasDynamicRelations for Article {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<i64>,
    pub label: String,
}

impl Model for Tag {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "tags"
    }

    fn primary_key(&self) -> Option<i64> {
        self.id
    }

    fn set_primary_key(&mut self, key: i64) {
        self.id = Some(key);
    }

    fn from_database_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            label: row.get("label")?,
        })
    }

    fn to_fields(&self) -> HashMap<String, DatabaseValue> {
        HashMap::from([("label".to_string(), self.label.clone().into())])
    }
}


/// Create the fixture tables on `pool`
pub async fn create_fixture_tables(pool: &dyn DatabasePool) -> ModelResult<()> {
    let mut schema = SchemaBuilder::new(SqlDialect::SQLite);
    schema
        .create_table("pages", |t| {
            t.id("id");
            t.string("title", Some(255));
        })
        .create_table("articles", |t| {
            t.id("id");
            t.string("title", Some(255));
            t.boolean("published", false);
        })
        .create_table("tags", |t| {
            t.id("id");
            t.string("label", Some(100));
        });

    for statement in schema.to_sql() {
        pool.execute(&statement, &[]).await?;
    }
    Ok(())
}

/// Private in-memory database with fixture tables and the bridge table
pub async fn setup() -> DynamicRelations {
    setup_with(DynamicRelationsConfig::default()).await
}

pub async fn setup_with(config: DynamicRelationsConfig) -> DynamicRelations {
    init_tracing();

    let pool = connect("sqlite::memory:", DatabasePoolConfig::in_memory())
        .await
        .expect("in-memory pool");
    create_fixture_tables(pool.as_ref()).await.expect("fixture tables");

    let relations = DynamicRelations::with_config(pool, config).expect("valid config");
    relations.migrate().await.expect("bridge table migration");
    relations
}

pub async fn page(relations: &DynamicRelations, title: &str) -> Page {
    Page::create(pool(relations), Page { id: None, title: title.to_string() })
        .await
        .expect("page insert")
}

pub async fn article(relations: &DynamicRelations, title: &str) -> Article {
    Article::create(
        pool(relations),
        Article {
            id: None,
            title: title.to_string(),
            published: true,
        },
    )
    .await
    .expect("article insert")
}

pub async fn tag(relations: &DynamicRelations, label: &str) -> Tag {
    Tag::create(pool(relations), Tag { id: None, label: label.to_string() })
        .await
        .expect("tag insert")
}

pub fn pool(relations: &DynamicRelations) -> &dyn DatabasePool {
    relations.pool().as_ref()
}

/// Shared handle for tests that open several services on one database
pub fn shared(pool: Arc<dyn DatabasePool>) -> DynamicRelations {
    DynamicRelations::new(pool)
}
