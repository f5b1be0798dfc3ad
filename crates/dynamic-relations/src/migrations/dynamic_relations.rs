//! Bridge table migration

use crate::backends::SqlDialect;
use super::definitions::Migration;
use super::schema_builder::SchemaBuilder;

/// Migration id of the bridge table migration
pub const MIGRATION_ID: &str = "2020_03_30_000001_create_dynamic_relations_table";

/// Migration creating the bridge table under `table`.
///
/// Columns: `id`, `relation`, `is_many` (default false), the `model` and
/// `result` polymorphic pairs with their indexes, and timestamps.
pub fn create_dynamic_relations_table(table: &str, dialect: SqlDialect) -> Migration {
    let mut up = SchemaBuilder::new(dialect);
    up.create_table(table, |t| {
        t.id("id");
        t.string("relation", Some(255));
        t.boolean("is_many", false);
        t.morphs("model");
        t.morphs("result");
        t.timestamps();
    });

    let mut down = SchemaBuilder::new(dialect);
    down.drop_table(table);

    Migration {
        id: MIGRATION_ID.to_string(),
        name: format!("create {} table", table),
        up: up.to_sql(),
        down: down.to_sql(),
    }
}
