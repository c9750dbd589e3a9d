//! SQL Builder for generating parameterized PostgreSQL queries over workspace tables.
//!
//! Conditions are kept as a structured [`Predicate`] tree so that the same
//! query can be rendered to SQL for PostgreSQL or evaluated directly by the
//! in-memory backend.
//!
//! ## Features
//!
//! - **Fluent API**: Chain method calls to build queries
//! - **Validated identifiers**: Schema, table and column names are checked before quoting
//! - **Parameterized queries**: All user input via bind parameters
//! - **Full-text search**: `@@ to_tsquery` predicates and `ts_rank`/`ts_rank_cd` ordering

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during SQL building.
#[derive(Debug, Error)]
pub enum SqlBuilderError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Query too complex: {0}")]
    QueryTooComplex(String),
}

/// Validate an identifier (schema, table or column name).
///
/// Only allows alphanumeric characters and underscores.
pub fn validate_identifier(name: &str) -> Result<(), SqlBuilderError> {
    if name.is_empty() {
        return Err(SqlBuilderError::InvalidIdentifier(
            "Empty identifier".to_string(),
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SqlBuilderError::InvalidIdentifier(name.to_string()));
    }

    Ok(())
}

/// Escape a PostgreSQL identifier (table name, column name).
pub fn escape_identifier(name: &str) -> Result<String, SqlBuilderError> {
    validate_identifier(name)?;
    Ok(format!("\"{name}\""))
}

// ============================================================================
// Predicates
// ============================================================================

/// Comparison operators for column predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Greater than or equal (>=)
    Ge,
    /// Less than or equal (<=)
    Le,
    /// LIKE pattern match
    Like,
    /// Case-insensitive LIKE
    ILike,
}

impl Operator {
    /// Get the SQL operator string.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
        }
    }
}

/// SQL value types for parameterized queries.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
    Json(Value),
    TextArray(Vec<String>),
    Null,
}

impl SqlValue {
    /// Get the value as a string for display/debugging.
    pub fn as_display_str(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Uuid(u) => u.to_string(),
            Self::Timestamp(t) => t.to_rfc3339(),
            Self::Json(v) => v.to_string(),
            Self::TextArray(items) => format!("{{{}}}", items.join(",")),
            Self::Null => "NULL".to_string(),
        }
    }

    /// The JSON representation a row column would hold for this value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => Value::from(*f),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Uuid(u) => Value::String(u.to_string()),
            Self::Timestamp(t) => Value::String(t.to_rfc3339()),
            Self::Json(v) => v.clone(),
            Self::TextArray(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            Self::Null => Value::Null,
        }
    }
}

/// A condition on a workspace table.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column op value`
    Compare {
        column: String,
        op: Operator,
        value: SqlValue,
    },

    /// `column IN (values...)`
    In { column: String, values: Vec<SqlValue> },

    /// `column IS [NOT] NULL`
    IsNull { column: String, negated: bool },

    /// Array overlap: `column && values`
    ArrayOverlap { column: String, values: Vec<String> },

    /// Any array element matches a case-insensitive pattern
    ArrayElementILike { column: String, pattern: String },

    /// Full-text match: `column @@ to_tsquery('simple', query)`
    TsMatch { column: String, query: String },

    /// Combine conditions with OR
    Or(Vec<Predicate>),

    /// Combine conditions with AND
    And(Vec<Predicate>),

    /// Negation of a condition
    Not(Box<Predicate>),

    /// Always true
    True,

    /// Always false
    False,
}

impl Predicate {
    pub fn compare(column: impl Into<String>, op: Operator, value: SqlValue) -> Self {
        Self::Compare {
            column: column.into(),
            op,
            value,
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull {
            column: column.into(),
            negated: false,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self::IsNull {
            column: column.into(),
            negated: true,
        }
    }

    pub fn in_values(column: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self::In {
            column: column.into(),
            values,
        }
    }

    /// Create an OR condition. A `True` operand makes the whole condition `True`.
    pub fn or(conditions: Vec<Predicate>) -> Self {
        let mut kept = Vec::with_capacity(conditions.len());
        for condition in conditions {
            match condition {
                Self::True => return Self::True,
                Self::False => {}
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Self::False,
            1 => kept.pop().unwrap_or(Self::False),
            _ => Self::Or(kept),
        }
    }

    /// Create an AND condition. A `False` operand makes the whole condition `False`.
    pub fn and(conditions: Vec<Predicate>) -> Self {
        let mut kept = Vec::with_capacity(conditions.len());
        for condition in conditions {
            match condition {
                Self::False => return Self::False,
                Self::True => {}
                other => kept.push(other),
            }
        }
        match kept.len() {
            0 => Self::True,
            1 => kept.pop().unwrap_or(Self::True),
            _ => Self::And(kept),
        }
    }

    /// Create a NOT condition.
    pub fn negate(condition: Predicate) -> Self {
        match condition {
            Self::True => Self::False,
            Self::False => Self::True,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Number of leaf conditions in the tree.
    pub fn condition_count(&self) -> usize {
        match self {
            Self::Or(children) | Self::And(children) => {
                children.iter().map(Self::condition_count).sum()
            }
            Self::Not(child) => child.condition_count(),
            Self::True | Self::False => 0,
            _ => 1,
        }
    }

    fn to_sql(&self, params: &mut Vec<SqlValue>) -> Result<String, SqlBuilderError> {
        match self {
            Self::Compare { column, op, value } => {
                let col = escape_identifier(column)?;
                params.push(value.clone());
                Ok(format!("({col} {} ${})", op.as_sql(), params.len()))
            }

            Self::In { column, values } => {
                if values.is_empty() {
                    return Ok("FALSE".to_string());
                }
                let col = escape_identifier(column)?;
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| {
                        params.push(v.clone());
                        format!("${}", params.len())
                    })
                    .collect();
                Ok(format!("({col} IN ({}))", placeholders.join(", ")))
            }

            Self::IsNull { column, negated } => {
                let col = escape_identifier(column)?;
                if *negated {
                    Ok(format!("({col} IS NOT NULL)"))
                } else {
                    Ok(format!("({col} IS NULL)"))
                }
            }

            Self::ArrayOverlap { column, values } => {
                let col = escape_identifier(column)?;
                params.push(SqlValue::TextArray(values.clone()));
                Ok(format!("({col}::text[] && ${})", params.len()))
            }

            Self::ArrayElementILike { column, pattern } => {
                let col = escape_identifier(column)?;
                params.push(SqlValue::Text(pattern.clone()));
                Ok(format!(
                    "(EXISTS (SELECT 1 FROM unnest({col}::text[]) AS elem WHERE elem ILIKE ${}))",
                    params.len()
                ))
            }

            Self::TsMatch { column, query } => {
                let col = escape_identifier(column)?;
                params.push(SqlValue::Text(query.clone()));
                Ok(format!(
                    "({col} @@ to_tsquery('simple', ${}))",
                    params.len()
                ))
            }

            Self::Or(conditions) => {
                if conditions.is_empty() {
                    return Ok("FALSE".to_string());
                }
                let parts = conditions
                    .iter()
                    .map(|c| c.to_sql(params))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", parts.join(" OR ")))
            }

            Self::And(conditions) => {
                if conditions.is_empty() {
                    return Ok("TRUE".to_string());
                }
                let parts = conditions
                    .iter()
                    .map(|c| c.to_sql(params))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", parts.join(" AND ")))
            }

            Self::Not(condition) => {
                let inner = condition.to_sql(params)?;
                Ok(format!("(NOT {inner})"))
            }

            Self::True => Ok("TRUE".to_string()),
            Self::False => Ok("FALSE".to_string()),
        }
    }
}

// ============================================================================
// Ordering
// ============================================================================

/// Sort order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

impl NullsOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderByExpr {
    Column {
        column: String,
        order: SortOrder,
        nulls: NullsOrder,
    },
    /// `ts_rank_cd(column, to_tsquery('simple', query))`
    TsRankCd {
        column: String,
        query: String,
        order: SortOrder,
    },
    /// `ts_rank(column, to_tsquery('simple', query))`
    TsRank {
        column: String,
        query: String,
        order: SortOrder,
    },
}

impl OrderByExpr {
    pub fn asc(column: impl Into<String>) -> Self {
        Self::Column {
            column: column.into(),
            order: SortOrder::Asc,
            nulls: NullsOrder::Last,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::Column {
            column: column.into(),
            order: SortOrder::Desc,
            nulls: NullsOrder::First,
        }
    }

    fn to_sql(&self, params: &mut Vec<SqlValue>) -> Result<String, SqlBuilderError> {
        match self {
            Self::Column {
                column,
                order,
                nulls,
            } => Ok(format!(
                "{} {} {}",
                escape_identifier(column)?,
                order.as_sql(),
                nulls.as_sql()
            )),
            Self::TsRankCd {
                column,
                query,
                order,
            } => {
                params.push(SqlValue::Text(query.clone()));
                Ok(format!(
                    "ts_rank_cd({}, to_tsquery('simple', ${})) {}",
                    escape_identifier(column)?,
                    params.len(),
                    order.as_sql()
                ))
            }
            Self::TsRank {
                column,
                query,
                order,
            } => {
                params.push(SqlValue::Text(query.clone()));
                Ok(format!(
                    "ts_rank({}, to_tsquery('simple', ${})) {}",
                    escape_identifier(column)?,
                    params.len(),
                    order.as_sql()
                ))
            }
        }
    }
}

// ============================================================================
// Select Query Builder
// ============================================================================

/// Maximum number of conditions allowed to prevent DoS
const MAX_CONDITIONS: usize = 100;

/// Table alias used by [`SelectQuery::build_jsonb`].
const ROW_ALIAS: &str = "rh_row";

/// What the query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Return full rows
    Rows,
    /// Return the id column only
    IdsOnly,
}

/// Builder for a `SELECT` over one workspace table.
///
/// # Example
///
/// ```ignore
/// let query = SelectQuery::new("workspace_acme", "person")
///     .where_condition(Predicate::compare("city", Operator::Eq, SqlValue::Text("Paris".into())))
///     .order_by(OrderByExpr::asc("id"))
///     .take(10)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    schema: String,
    table: String,
    conditions: Vec<Predicate>,
    order_by: Vec<OrderByExpr>,
    limit: Option<usize>,
    mode: QueryMode,
}

impl SelectQuery {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            mode: QueryMode::Rows,
        }
    }

    /// Add a condition (AND semantics).
    pub fn where_condition(mut self, condition: Predicate) -> Self {
        self.and_where(condition);
        self
    }

    /// Append a condition in place (AND semantics). `TRUE` is dropped.
    pub fn and_where(&mut self, condition: Predicate) {
        if condition != Predicate::True {
            self.conditions.push(condition);
        }
    }

    pub fn order_by(mut self, expr: OrderByExpr) -> Self {
        self.order_by.push(expr);
        self
    }

    pub fn push_order_by(&mut self, expr: OrderByExpr) {
        self.order_by.push(expr);
    }

    pub fn take(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = Some(limit);
    }

    /// Set query mode to return ids only.
    pub fn ids_only(mut self) -> Self {
        self.mode = QueryMode::IdsOnly;
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn conditions(&self) -> &[Predicate] {
        &self.conditions
    }

    /// All conditions combined under AND.
    pub fn predicate(&self) -> Predicate {
        Predicate::and(self.conditions.clone())
    }

    pub fn order(&self) -> &[OrderByExpr] {
        &self.order_by
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    /// Validate the query complexity.
    fn validate(&self) -> Result<(), SqlBuilderError> {
        let count: usize = self.conditions.iter().map(Predicate::condition_count).sum();
        if count > MAX_CONDITIONS {
            return Err(SqlBuilderError::QueryTooComplex(format!(
                "Too many conditions: {count} (max {MAX_CONDITIONS})"
            )));
        }
        Ok(())
    }

    fn full_table(&self) -> Result<String, SqlBuilderError> {
        Ok(format!(
            "{}.{}",
            escape_identifier(&self.schema)?,
            escape_identifier(&self.table)?
        ))
    }

    fn build_where_clause(
        &self,
        params: &mut Vec<SqlValue>,
    ) -> Result<Option<String>, SqlBuilderError> {
        if self.conditions.is_empty() {
            return Ok(None);
        }

        let parts = self
            .conditions
            .iter()
            .map(|c| c.to_sql(params))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(parts.join(" AND ")))
    }

    /// Build the SQL query and parameters.
    pub fn build(&self) -> Result<BuiltQuery, SqlBuilderError> {
        let select_clause = match self.mode {
            QueryMode::Rows => "*".to_string(),
            QueryMode::IdsOnly => escape_identifier("id")?,
        };
        self.build_select(&select_clause, None)
    }

    /// Build the query so each result row is one `jsonb` value.
    ///
    /// The projection sits in the same statement as `ORDER BY` and `LIMIT`,
    /// so rows arrive in the query's order.
    pub fn build_jsonb(&self) -> Result<BuiltQuery, SqlBuilderError> {
        let projection = match self.mode {
            QueryMode::Rows => format!("to_jsonb({ROW_ALIAS})"),
            QueryMode::IdsOnly => format!("jsonb_build_object('id', {ROW_ALIAS}.\"id\")"),
        };
        self.build_select(&projection, Some(ROW_ALIAS))
    }

    fn build_select(
        &self,
        select_clause: &str,
        alias: Option<&str>,
    ) -> Result<BuiltQuery, SqlBuilderError> {
        self.validate()?;

        let mut params = Vec::new();
        let mut sql = format!("SELECT {select_clause} FROM {}", self.full_table()?);
        if let Some(alias) = alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }

        if let Some(where_sql) = self.build_where_clause(&mut params)? {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|o| o.to_sql(&mut params))
                .collect::<Result<Vec<_>, _>>()?;
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        Ok(BuiltQuery { sql, params })
    }

    /// Build the COUNT query over the same conditions.
    pub fn build_count(&self) -> Result<BuiltQuery, SqlBuilderError> {
        self.validate()?;

        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) AS total FROM {}", self.full_table()?);

        if let Some(where_sql) = self.build_where_clause(&mut params)? {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        Ok(BuiltQuery { sql, params })
    }
}

/// A built SQL query with parameters.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl fmt::Display for BuiltQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(s.to_string())
    }

    #[test]
    fn test_escape_identifier_valid() {
        assert_eq!(escape_identifier("nameFirstName").unwrap(), "\"nameFirstName\"");
        assert_eq!(escape_identifier("workspace_1").unwrap(), "\"workspace_1\"");
    }

    #[test]
    fn test_escape_identifier_invalid() {
        assert!(escape_identifier("name\"; DROP TABLE person").is_err());
        assert!(escape_identifier("").is_err());
    }

    #[test]
    fn test_build_simple_query() {
        let query = SelectQuery::new("ws", "person")
            .where_condition(Predicate::compare("city", Operator::Eq, text("Paris")))
            .order_by(OrderByExpr::asc("id"))
            .take(10)
            .build()
            .unwrap();

        assert_eq!(
            query.sql,
            "SELECT * FROM \"ws\".\"person\" WHERE (\"city\" = $1) ORDER BY \"id\" ASC NULLS LAST LIMIT 10"
        );
        assert_eq!(query.params, vec![text("Paris")]);
    }

    #[test]
    fn test_build_nested_conditions() {
        let predicate = Predicate::or(vec![
            Predicate::compare("city", Operator::ILike, text("%par%")),
            Predicate::negate(Predicate::in_values(
                "status",
                vec![text("open"), text("won")],
            )),
        ]);
        let query = SelectQuery::new("ws", "opportunity")
            .where_condition(predicate)
            .where_condition(Predicate::is_null("deletedAt"))
            .build()
            .unwrap();

        assert_eq!(
            query.sql,
            "SELECT * FROM \"ws\".\"opportunity\" WHERE ((\"city\" ILIKE $1) OR (NOT (\"status\" IN ($2, $3)))) AND (\"deletedAt\" IS NULL)"
        );
        assert_eq!(query.params.len(), 3);
    }

    #[test]
    fn test_empty_in_is_false() {
        let query = SelectQuery::new("ws", "person")
            .where_condition(Predicate::in_values("id", vec![]))
            .build()
            .unwrap();
        assert!(query.sql.ends_with("WHERE FALSE"));
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_true_condition_dropped() {
        let query = SelectQuery::new("ws", "person")
            .where_condition(Predicate::and(vec![]))
            .build()
            .unwrap();
        assert_eq!(query.sql, "SELECT * FROM \"ws\".\"person\"");
    }

    #[test]
    fn test_rank_params_follow_where_params() {
        let query = SelectQuery::new("ws", "person")
            .where_condition(Predicate::TsMatch {
                column: "searchVector".into(),
                query: "jo:*".into(),
            })
            .order_by(OrderByExpr::TsRankCd {
                column: "searchVector".into(),
                query: "jo:*".into(),
                order: SortOrder::Desc,
            })
            .build()
            .unwrap();

        assert!(query.sql.contains("(\"searchVector\" @@ to_tsquery('simple', $1))"));
        assert!(query.sql.contains("ts_rank_cd(\"searchVector\", to_tsquery('simple', $2)) DESC"));
        assert_eq!(query.params.len(), 2);
    }

    #[test]
    fn test_build_count_ignores_order_and_limit() {
        let builder = SelectQuery::new("ws", "person")
            .where_condition(Predicate::compare("city", Operator::Eq, text("Paris")))
            .order_by(OrderByExpr::desc("createdAt"))
            .take(5);
        let count = builder.build_count().unwrap();
        assert_eq!(
            count.sql,
            "SELECT COUNT(*) AS total FROM \"ws\".\"person\" WHERE (\"city\" = $1)"
        );
    }

    #[test]
    fn test_build_jsonb_projects_in_ordered_statement() {
        let query = SelectQuery::new("ws", "person")
            .where_condition(Predicate::compare("city", Operator::Eq, text("Paris")))
            .order_by(OrderByExpr::desc("createdAt"))
            .take(5)
            .build_jsonb()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT to_jsonb(rh_row) FROM \"ws\".\"person\" AS rh_row WHERE (\"city\" = $1) ORDER BY \"createdAt\" DESC NULLS FIRST LIMIT 5"
        );

        let ids = SelectQuery::new("ws", "person").ids_only().build_jsonb().unwrap();
        assert_eq!(
            ids.sql,
            "SELECT jsonb_build_object('id', rh_row.\"id\") FROM \"ws\".\"person\" AS rh_row"
        );
    }

    #[test]
    fn test_ids_only() {
        let query = SelectQuery::new("ws", "person").ids_only().build().unwrap();
        assert_eq!(query.sql, "SELECT \"id\" FROM \"ws\".\"person\"");
    }

    #[test]
    fn test_array_predicates() {
        let query = SelectQuery::new("ws", "person")
            .where_condition(Predicate::ArrayOverlap {
                column: "tags".into(),
                values: vec!["vip".into()],
            })
            .where_condition(Predicate::ArrayElementILike {
                column: "tags".into(),
                pattern: "%v%".into(),
            })
            .build()
            .unwrap();
        assert!(query.sql.contains("(\"tags\"::text[] && $1)"));
        assert!(query.sql.contains("unnest(\"tags\"::text[]) AS elem WHERE elem ILIKE $2"));
    }

    #[test]
    fn test_too_many_conditions() {
        let many = (0..101)
            .map(|i| Predicate::compare("city", Operator::Eq, text(&i.to_string())))
            .collect();
        let result = SelectQuery::new("ws", "person")
            .where_condition(Predicate::or(many))
            .build();
        assert!(matches!(result, Err(SqlBuilderError::QueryTooComplex(_))));
    }

    #[test]
    fn test_negate_constants() {
        assert_eq!(Predicate::negate(Predicate::True), Predicate::False);
        assert_eq!(Predicate::or(vec![]), Predicate::False);
        assert_eq!(Predicate::and(vec![]), Predicate::True);

        let city = Predicate::compare("city", Operator::Eq, text("Paris"));
        assert_eq!(Predicate::or(vec![Predicate::True, city.clone()]), Predicate::True);
        assert_eq!(Predicate::or(vec![Predicate::False, city.clone()]), city);
        assert_eq!(Predicate::and(vec![Predicate::False, city.clone()]), Predicate::False);
        assert_eq!(Predicate::and(vec![Predicate::True, city.clone()]), city);
    }
}
