//! Query Builder Types - Core types and enums for query building

use std::fmt;

use crate::backends::DatabaseValue;
use super::builder::QueryBuilder;

/// Comparison operators usable in WHERE conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
}

impl QueryOperator {
    /// Parse a textual operator, as accepted by `where_condition` and
    /// relationship existence counts
    pub fn parse(operator: &str) -> Option<Self> {
        match operator.trim().to_uppercase().as_str() {
            "=" => Some(QueryOperator::Equal),
            "!=" | "<>" => Some(QueryOperator::NotEqual),
            ">" => Some(QueryOperator::GreaterThan),
            ">=" => Some(QueryOperator::GreaterThanOrEqual),
            "<" => Some(QueryOperator::LessThan),
            "<=" => Some(QueryOperator::LessThanOrEqual),
            "LIKE" => Some(QueryOperator::Like),
            _ => None,
        }
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Equal => write!(f, "="),
            QueryOperator::NotEqual => write!(f, "!="),
            QueryOperator::GreaterThan => write!(f, ">"),
            QueryOperator::GreaterThanOrEqual => write!(f, ">="),
            QueryOperator::LessThan => write!(f, "<"),
            QueryOperator::LessThanOrEqual => write!(f, "<="),
            QueryOperator::Like => write!(f, "LIKE"),
        }
    }
}

/// Where clause condition
///
/// Values are always bound as parameters; only column names and
/// subquery SQL end up in the statement text.
#[derive(Debug, Clone)]
pub enum WhereCondition {
    /// `column <op> ?`
    Compare {
        column: String,
        operator: QueryOperator,
        value: DatabaseValue,
    },
    /// `column [NOT] IN (?, ?, ...)`
    In {
        column: String,
        values: Vec<DatabaseValue>,
        negated: bool,
    },
    /// `column IS [NOT] NULL`
    Null { column: String, negated: bool },
    /// `left <op> right`, comparing two columns (used to correlate subqueries)
    Columns {
        left: String,
        operator: QueryOperator,
        right: String,
    },
    /// `[NOT] EXISTS (subquery)`
    Exists {
        subquery: Box<QueryBuilder>,
        negated: bool,
    },
    /// `(SELECT COUNT(*) ...) <op> ?`
    SubqueryCount {
        subquery: Box<QueryBuilder>,
        operator: QueryOperator,
        count: i64,
    },
}

/// Join types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
        }
    }
}

/// Join clause
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub on_conditions: Vec<(String, String)>, // (left_column, right_column)
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Query types supported by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Delete,
}

/// Column assignment for INSERT statements
#[derive(Debug, Clone)]
pub struct SetClause {
    pub column: String,
    pub value: DatabaseValue,
}
