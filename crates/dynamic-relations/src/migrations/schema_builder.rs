//! Schema Builder - DSL for creating database schema changes
//!
//! Provides a fluent interface for building SQL schema modification statements
//! used in migrations. Column types follow the target `SqlDialect`.

use crate::backends::SqlDialect;

/// Basic schema operations for migrations
pub struct SchemaBuilder {
    dialect: SqlDialect,
    statements: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder for a dialect
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            statements: Vec::new(),
        }
    }

    /// Create a new table, followed by the indexes its columns declared
    pub fn create_table<F>(&mut self, table_name: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut TableBuilder),
    {
        let mut table_builder = TableBuilder::new(table_name, self.dialect);
        callback(&mut table_builder);

        self.statements.push(table_builder.to_sql());
        self.statements.extend(table_builder.index_statements());
        self
    }

    /// Drop a table
    pub fn drop_table(&mut self, table_name: &str) -> &mut Self {
        self.statements
            .push(format!("DROP TABLE IF EXISTS {}", table_name));
        self
    }

    /// Create an index
    pub fn create_index(
        &mut self,
        table_name: &str,
        column_names: &[&str],
        index_name: Option<&str>,
    ) -> &mut Self {
        self.statements
            .push(index_sql(table_name, column_names, index_name));
        self
    }

    /// Get all SQL statements
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.clone()
    }

    /// All statements joined into one script
    pub fn build(&self) -> String {
        self.statements
            .iter()
            .map(|s| format!("{};", s))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn index_sql(table_name: &str, column_names: &[&str], index_name: Option<&str>) -> String {
    let default_name = format!("idx_{}_{}", table_name, column_names.join("_"));
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
        index_name.unwrap_or(&default_name),
        table_name,
        column_names.join(", ")
    )
}

/// Table builder for CREATE TABLE statements
pub struct TableBuilder {
    table_name: String,
    dialect: SqlDialect,
    columns: Vec<String>,
    constraints: Vec<String>,
    indexes: Vec<Vec<String>>,
}

impl TableBuilder {
    pub fn new(table_name: &str, dialect: SqlDialect) -> Self {
        Self {
            table_name: table_name.to_string(),
            dialect,
            columns: Vec::new(),
            constraints: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Add a column
    pub fn column(&mut self, name: &str, column_type: &str) -> &mut Self {
        self.columns.push(format!("{} {}", name, column_type));
        self
    }

    /// Add an ID column (auto-increment primary key)
    pub fn id(&mut self, name: &str) -> &mut Self {
        self.columns
            .push(format!("{} {}", name, self.dialect.auto_increment_primary_key()));
        self
    }

    /// Add a string column
    pub fn string(&mut self, name: &str, length: Option<u32>) -> &mut Self {
        let column_type = match length {
            Some(len) => format!("VARCHAR({})", len),
            None => "TEXT".to_string(),
        };
        self.columns.push(format!("{} {} NOT NULL", name, column_type));
        self
    }

    /// Add a 64-bit integer column
    pub fn big_integer(&mut self, name: &str) -> &mut Self {
        self.columns
            .push(format!("{} {} NOT NULL", name, self.dialect.big_integer_type()));
        self
    }

    /// Add a boolean column with a default
    pub fn boolean(&mut self, name: &str, default: bool) -> &mut Self {
        let default = match (self.dialect, default) {
            (SqlDialect::PostgreSQL, true) => "TRUE",
            (SqlDialect::PostgreSQL, false) => "FALSE",
            (SqlDialect::SQLite, true) => "1",
            (SqlDialect::SQLite, false) => "0",
        };
        self.columns
            .push(format!("{} BOOLEAN NOT NULL DEFAULT {}", name, default));
        self
    }

    /// Add a polymorphic reference: `{name}_type`, `{name}_id` and an index over both
    pub fn morphs(&mut self, name: &str) -> &mut Self {
        let type_column = format!("{}_type", name);
        let id_column = format!("{}_id", name);

        self.string(&type_column, Some(255));
        self.big_integer(&id_column);
        self.indexes.push(vec![type_column, id_column]);
        self
    }

    /// Add nullable created_at/updated_at columns
    pub fn timestamps(&mut self) -> &mut Self {
        let column_type = self.dialect.timestamp_type();
        self.columns.push(format!("created_at {} NULL", column_type));
        self.columns.push(format!("updated_at {} NULL", column_type));
        self
    }

    /// Add an index over columns
    pub fn index(&mut self, columns: &[&str]) -> &mut Self {
        self.indexes
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Add a unique constraint
    pub fn unique(&mut self, columns: &[&str]) -> &mut Self {
        self.constraints
            .push(format!("UNIQUE ({})", columns.join(", ")));
        self
    }

    /// Build the CREATE TABLE SQL
    pub fn to_sql(&self) -> String {
        let mut parts = self.columns.clone();
        parts.extend(self.constraints.clone());

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.table_name,
            parts.join(",\n    ")
        )
    }

    /// CREATE INDEX statements for the declared indexes
    pub fn index_statements(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|columns| {
                let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
                index_sql(&self.table_name, &columns, None)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morphs_add_columns_and_index() {
        let mut builder = SchemaBuilder::new(SqlDialect::PostgreSQL);
        builder.create_table("comments", |table| {
            table.id("id");
            table.morphs("commentable");
            table.timestamps();
        });

        let statements = builder.to_sql();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("id BIGSERIAL PRIMARY KEY"));
        assert!(statements[0].contains("commentable_type VARCHAR(255) NOT NULL"));
        assert!(statements[0].contains("commentable_id BIGINT NOT NULL"));
        assert!(statements[0].contains("created_at TIMESTAMPTZ NULL"));
        assert_eq!(
            statements[1],
            "CREATE INDEX IF NOT EXISTS idx_comments_commentable_type_commentable_id ON comments (commentable_type, commentable_id)"
        );
    }

    #[test]
    fn test_boolean_defaults_follow_dialect() {
        let mut pg = TableBuilder::new("flags", SqlDialect::PostgreSQL);
        pg.boolean("enabled", false);
        assert!(pg.to_sql().contains("enabled BOOLEAN NOT NULL DEFAULT FALSE"));

        let mut lite = TableBuilder::new("flags", SqlDialect::SQLite);
        lite.id("id").boolean("enabled", true);
        let sql = lite.to_sql();
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("enabled BOOLEAN NOT NULL DEFAULT 1"));
    }
}
