//! Query Builder SQL generation
//!
//! Statements are rendered for a specific dialect. Placeholders are numbered
//! across the whole statement, subqueries included, so the parameter list
//! returned alongside the SQL binds in order.

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::{DatabaseValue, SqlDialect};

/// Accumulates SQL text and bound parameters for one statement
struct SqlWriter {
    sql: String,
    params: Vec<DatabaseValue>,
    dialect: SqlDialect,
}

impl SqlWriter {
    fn new(dialect: SqlDialect) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    fn push_str(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn push_param(&mut self, value: &DatabaseValue) {
        let placeholder = self.dialect.parameter_placeholder(self.params.len());
        self.sql.push_str(&placeholder);
        self.params.push(value.clone());
    }

    fn finish(self) -> (String, Vec<DatabaseValue>) {
        (self.sql, self.params)
    }
}

impl<M> QueryBuilder<M> {
    /// Generate SQL with dialect placeholders and return the bound parameters
    pub fn to_sql_with_params(&self, dialect: SqlDialect) -> (String, Vec<DatabaseValue>) {
        let mut writer = SqlWriter::new(dialect);
        match self.query_type {
            QueryType::Select => self.write_select(&mut writer, None),
            QueryType::Insert => self.write_insert(&mut writer),
            QueryType::Delete => self.write_delete(&mut writer),
        }
        writer.finish()
    }

    /// Render the query with PostgreSQL placeholders, for logging and tests
    pub fn to_sql(&self) -> String {
        self.to_sql_with_params(SqlDialect::PostgreSQL).0
    }

    fn write_select(&self, writer: &mut SqlWriter, projection: Option<&str>) {
        if self.distinct {
            writer.push_str("SELECT DISTINCT ");
        } else {
            writer.push_str("SELECT ");
        }

        match projection {
            Some(expr) => writer.push_str(expr),
            None if self.select_fields.is_empty() => writer.push_str("*"),
            None => writer.push_str(&self.select_fields.join(", ")),
        }

        if let Some(table) = &self.from_table {
            writer.push_str(" FROM ");
            writer.push_str(table);
        }

        for join in &self.joins {
            writer.push_str(&format!(" {} {}", join.join_type, join.table));
            if !join.on_conditions.is_empty() {
                let conditions: Vec<String> = join
                    .on_conditions
                    .iter()
                    .map(|(left, right)| format!("{} = {}", left, right))
                    .collect();
                writer.push_str(" ON ");
                writer.push_str(&conditions.join(" AND "));
            }
        }

        self.write_where(writer);

        // Aggregating projections ignore ordering and paging
        if projection.is_some() {
            return;
        }

        if !self.order_by.is_empty() {
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            writer.push_str(" ORDER BY ");
            writer.push_str(&order_clauses.join(", "));
        }

        if let Some(limit) = self.limit_count {
            writer.push_str(&format!(" LIMIT {}", limit));
        }
    }

    fn write_insert(&self, writer: &mut SqlWriter) {
        let Some(table) = &self.insert_table else {
            return;
        };
        writer.push_str(&format!("INSERT INTO {}", table));

        if self.set_clauses.is_empty() {
            writer.push_str(" DEFAULT VALUES");
        } else {
            let columns: Vec<&str> = self.set_clauses.iter().map(|c| c.column.as_str()).collect();
            writer.push_str(&format!(" ({}) VALUES (", columns.join(", ")));
            for (i, clause) in self.set_clauses.iter().enumerate() {
                if i > 0 {
                    writer.push_str(", ");
                }
                writer.push_param(&clause.value);
            }
            writer.push_str(")");
        }

        if !self.returning.is_empty() {
            writer.push_str(" RETURNING ");
            writer.push_str(&self.returning.join(", "));
        }
    }

    fn write_delete(&self, writer: &mut SqlWriter) {
        let Some(table) = &self.delete_table else {
            return;
        };
        writer.push_str(&format!("DELETE FROM {}", table));
        self.write_where(writer);
    }

    fn write_where(&self, writer: &mut SqlWriter) {
        for (i, condition) in self.where_conditions.iter().enumerate() {
            writer.push_str(if i == 0 { " WHERE " } else { " AND " });
            write_condition(writer, condition);
        }
    }
}

fn write_condition(writer: &mut SqlWriter, condition: &WhereCondition) {
    match condition {
        WhereCondition::Compare { column, operator, value } => {
            writer.push_str(&format!("{} {} ", column, operator));
            writer.push_param(value);
        }
        WhereCondition::In { values, negated, .. } if values.is_empty() => {
            // IN () is not valid SQL in every dialect
            writer.push_str(if *negated { "1 = 1" } else { "1 = 0" });
        }
        WhereCondition::In { column, values, negated } => {
            writer.push_str(column);
            writer.push_str(if *negated { " NOT IN (" } else { " IN (" });
            for (j, value) in values.iter().enumerate() {
                if j > 0 {
                    writer.push_str(", ");
                }
                writer.push_param(value);
            }
            writer.push_str(")");
        }
        WhereCondition::Null { column, negated } => {
            writer.push_str(column);
            writer.push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
        }
        WhereCondition::Columns { left, operator, right } => {
            writer.push_str(&format!("{} {} {}", left, operator, right));
        }
        WhereCondition::Exists { subquery, negated } => {
            writer.push_str(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
            subquery.write_select(writer, None);
            writer.push_str(")");
        }
        WhereCondition::SubqueryCount { subquery, operator, count } => {
            writer.push_str("(");
            subquery.write_select(writer, Some("COUNT(*)"));
            writer.push_str(&format!(") {} ", operator));
            writer.push_param(&DatabaseValue::Int64(*count));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::backends::{DatabaseValue, SqlDialect};
    use crate::query::{QueryBuilder, QueryOperator};

    #[test]
    fn test_select_binds_values_in_order() {
        let query: QueryBuilder = QueryBuilder::new()
            .select("articles.*")
            .from("articles")
            .join("dynamic_relations", "dynamic_relations.result_id", "articles.id")
            .where_eq("dynamic_relations.model_id", 7i64)
            .where_eq("dynamic_relations.relation", "article")
            .order_by("dynamic_relations.id");

        let (sql, params) = query.to_sql_with_params(SqlDialect::PostgreSQL);
        assert_eq!(
            sql,
            "SELECT articles.* FROM articles INNER JOIN dynamic_relations ON dynamic_relations.result_id = articles.id \
             WHERE dynamic_relations.model_id = $1 AND dynamic_relations.relation = $2 ORDER BY dynamic_relations.id ASC"
        );
        assert_eq!(params, vec![DatabaseValue::Int64(7), DatabaseValue::String("article".to_string())]);

        let (sqlite_sql, _) = query.to_sql_with_params(SqlDialect::SQLite);
        assert!(sqlite_sql.contains("dynamic_relations.model_id = ? AND dynamic_relations.relation = ?"));
    }

    #[test]
    fn test_subquery_placeholders_continue_numbering() {
        let subquery: QueryBuilder = QueryBuilder::new()
            .from("dynamic_relations")
            .where_column("dynamic_relations.model_id", QueryOperator::Equal, "pages.id")
            .where_eq("dynamic_relations.relation", "article");

        let query: QueryBuilder = QueryBuilder::new()
            .from("pages")
            .where_eq("pages.title", "Home")
            .where_subquery_count(subquery, QueryOperator::GreaterThanOrEqual, 2);

        let (sql, params) = query.to_sql_with_params(SqlDialect::PostgreSQL);
        assert_eq!(
            sql,
            "SELECT * FROM pages WHERE pages.title = $1 AND (SELECT COUNT(*) FROM dynamic_relations \
             WHERE dynamic_relations.model_id = pages.id AND dynamic_relations.relation = $2) >= $3"
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params[2], DatabaseValue::Int64(2));
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let query: QueryBuilder = QueryBuilder::new()
            .delete_from("dynamic_relations")
            .where_in("result_id", Vec::<i64>::new());

        let (sql, params) = query.to_sql_with_params(SqlDialect::SQLite);
        assert_eq!(sql, "DELETE FROM dynamic_relations WHERE 1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn test_insert_with_returning() {
        let query: QueryBuilder = QueryBuilder::new()
            .insert_into("dynamic_relations")
            .set("relation", "article")
            .set("is_many", false)
            .returning("id");

        let (sql, params) = query.to_sql_with_params(SqlDialect::SQLite);
        assert_eq!(sql, "INSERT INTO dynamic_relations (relation, is_many) VALUES (?, ?) RETURNING id");
        assert_eq!(params[1], DatabaseValue::Bool(false));
    }
}
