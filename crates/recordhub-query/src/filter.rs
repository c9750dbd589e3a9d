//! Filter compiler: [`RecordFilter`] trees to [`Predicate`]s.
//!
//! Leaves are resolved against the object's field metadata so that every value
//! is bound with the type its column holds. Composite fields are addressed
//! through their sub-field columns and MANY_TO_ONE relations through their
//! join column.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use recordhub_core::{
    CompositePropertyKind, DELETED_AT_FIELD, FieldMetadata, FieldMetadataType, FilterLeaf,
    ObjectMetadataItem, RecordFilter, RelationType,
};
use serde_json::Value;
use thiserror::Error;

use crate::sql_builder::{Operator, Predicate, SelectQuery, SqlBuilderError, SqlValue};

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Unsupported filter operator '{operator}'")]
    UnsupportedOperator { operator: String },

    #[error("Unknown field '{field}' on object '{object}'")]
    UnknownField { object: String, field: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Object '{0}' is not searchable")]
    NotSearchable(String),

    #[error(transparent)]
    Builder(#[from] SqlBuilderError),
}

impl FilterError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }

    fn unknown(object: &ObjectMetadataItem, field: impl Into<String>) -> Self {
        Self::UnknownField {
            object: object.name_singular.clone(),
            field: field.into(),
        }
    }
}

/// Operators accepted in filter leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Is,
    Like,
    ILike,
    StartsWith,
    ContainsAny,
    ContainsILike,
}

impl FromStr for FilterOperator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "eq" => Self::Eq,
            "neq" => Self::Neq,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "in" => Self::In,
            "is" => Self::Is,
            "like" => Self::Like,
            "ilike" => Self::ILike,
            "startsWith" => Self::StartsWith,
            "containsAny" => Self::ContainsAny,
            "containsIlike" => Self::ContainsILike,
            other => {
                return Err(FilterError::UnsupportedOperator {
                    operator: other.to_string(),
                });
            }
        })
    }
}

/// A filterable column with the type its values are bound as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub column: String,
    pub field_type: FieldMetadataType,
}

/// Resolve a field (and optional composite sub-field) to its storage column.
pub fn resolve_column(
    object: &ObjectMetadataItem,
    field_name: &str,
    sub_field: Option<&str>,
) -> Result<ResolvedColumn, FilterError> {
    let Some(field) = object.field(field_name) else {
        // Join columns like `companyId` are addressable directly.
        if sub_field.is_none() && object.field_by_join_column(field_name).is_some() {
            return Ok(ResolvedColumn {
                column: field_name.to_string(),
                field_type: FieldMetadataType::Uuid,
            });
        }
        return Err(FilterError::unknown(object, field_name));
    };

    if field.is_composite() {
        let sub = sub_field.ok_or_else(|| {
            FilterError::invalid(field_name, "composite fields must be filtered by sub-field")
        })?;
        let property = field
            .composite_property(sub)
            .ok_or_else(|| FilterError::unknown(object, format!("{field_name}.{sub}")))?;
        let field_type = match property.kind {
            CompositePropertyKind::Text => FieldMetadataType::Text,
            CompositePropertyKind::Number => FieldMetadataType::Number,
        };
        return Ok(ResolvedColumn {
            column: recordhub_core::metadata::composite_column_name(&field.name, property.name),
            field_type,
        });
    }

    if let Some(sub) = sub_field {
        return Err(FilterError::unknown(object, format!("{field_name}.{sub}")));
    }

    match field.relation_type() {
        Some(RelationType::ManyToOne) => Ok(ResolvedColumn {
            column: join_column(field),
            field_type: FieldMetadataType::Uuid,
        }),
        Some(RelationType::OneToMany) => Err(FilterError::invalid(
            field_name,
            "one-to-many relations cannot be filtered",
        )),
        None if field.field_type == FieldMetadataType::TsVector => Err(FilterError::invalid(
            field_name,
            "search vectors are queried through search",
        )),
        None => Ok(ResolvedColumn {
            column: field.name.clone(),
            field_type: field.field_type,
        }),
    }
}

fn join_column(field: &FieldMetadata) -> String {
    field
        .settings
        .join_column_name
        .clone()
        .unwrap_or_else(|| field.conventional_join_column())
}

/// Convert a JSON filter operand into a bind parameter of the column's type.
pub fn to_sql_value(
    field: &str,
    field_type: FieldMetadataType,
    value: &Value,
) -> Result<SqlValue, FilterError> {
    use FieldMetadataType as T;

    match (field_type, value) {
        (_, Value::Null) => Ok(SqlValue::Null),

        (T::Uuid, Value::String(s)) => uuid::Uuid::parse_str(s)
            .map(SqlValue::Uuid)
            .map_err(|_| FilterError::invalid(field, format!("'{s}' is not a UUID"))),

        (T::Number | T::Position, Value::Number(n)) => Ok(match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Float(n.as_f64().unwrap_or_default()),
        }),

        (T::Boolean, Value::Bool(b)) => Ok(SqlValue::Boolean(*b)),

        (T::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| SqlValue::Timestamp(dt.with_timezone(&Utc)))
            .map_err(|_| FilterError::invalid(field, format!("'{s}' is not an RFC 3339 date"))),

        (T::Text | T::Select | T::MultiSelect, Value::String(s)) => Ok(SqlValue::Text(s.clone())),

        (T::RawJson, other) => Ok(SqlValue::Json(other.clone())),

        (_, other) => Err(FilterError::invalid(
            field,
            format!("{other} cannot be compared with a {field_type:?} field"),
        )),
    }
}

fn expect_string<'a>(field: &str, value: &'a Value) -> Result<&'a str, FilterError> {
    value
        .as_str()
        .ok_or_else(|| FilterError::invalid(field, "expected a string"))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn compile_leaf(leaf: &FilterLeaf, object: &ObjectMetadataItem) -> Result<Predicate, FilterError> {
    let operator: FilterOperator = leaf.operator.parse()?;
    let resolved = resolve_column(object, &leaf.field, leaf.sub_field.as_deref())?;
    let field = leaf.field.as_str();
    let column = resolved.column;

    let compare = |op: Operator| -> Result<Predicate, FilterError> {
        if leaf.value.is_null() {
            return Err(FilterError::invalid(field, "use 'is' to compare with NULL"));
        }
        let value = to_sql_value(field, resolved.field_type, &leaf.value)?;
        Ok(Predicate::compare(column.clone(), op, value))
    };

    match operator {
        FilterOperator::Eq => compare(Operator::Eq),
        FilterOperator::Neq => compare(Operator::Ne),
        FilterOperator::Gt => compare(Operator::Gt),
        FilterOperator::Gte => compare(Operator::Ge),
        FilterOperator::Lt => compare(Operator::Lt),
        FilterOperator::Lte => compare(Operator::Le),

        FilterOperator::In => {
            let items = leaf
                .value
                .as_array()
                .ok_or_else(|| FilterError::invalid(field, "'in' expects an array"))?;
            let values = items
                .iter()
                .map(|v| to_sql_value(field, resolved.field_type, v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Predicate::in_values(column, values))
        }

        FilterOperator::Is => match expect_string(field, &leaf.value)? {
            "NULL" => Ok(Predicate::is_null(column)),
            "NOT_NULL" => Ok(Predicate::is_not_null(column)),
            other => Err(FilterError::invalid(
                field,
                format!("'is' expects NULL or NOT_NULL, got '{other}'"),
            )),
        },

        FilterOperator::Like | FilterOperator::ILike => {
            let pattern = expect_string(field, &leaf.value)?;
            let op = if operator == FilterOperator::Like {
                Operator::Like
            } else {
                Operator::ILike
            };
            Ok(Predicate::compare(column, op, SqlValue::Text(pattern.to_string())))
        }

        FilterOperator::StartsWith => {
            let prefix = expect_string(field, &leaf.value)?;
            Ok(Predicate::compare(
                column,
                Operator::Like,
                SqlValue::Text(format!("{}%", escape_like(prefix))),
            ))
        }

        FilterOperator::ContainsAny => {
            let items = leaf
                .value
                .as_array()
                .ok_or_else(|| FilterError::invalid(field, "'containsAny' expects an array"))?;
            let values = items
                .iter()
                .map(|v| expect_string(field, v).map(str::to_string))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Predicate::ArrayOverlap { column, values })
        }

        FilterOperator::ContainsILike => {
            let pattern = expect_string(field, &leaf.value)?;
            Ok(Predicate::ArrayElementILike {
                column,
                pattern: pattern.to_string(),
            })
        }
    }
}

/// Compile a filter tree into a predicate.
///
/// An empty subtree is `TRUE` wherever it appears, so `or: [{}, x]` is `TRUE`
/// and `not: {}` is `FALSE`.
pub fn compile_filter(
    filter: &RecordFilter,
    object: &ObjectMetadataItem,
) -> Result<Predicate, FilterError> {
    if filter.is_empty() {
        return Ok(Predicate::True);
    }

    match filter {
        RecordFilter::Leaf(leaf) => compile_leaf(leaf, object),
        RecordFilter::And(children) => Ok(Predicate::and(compile_children(children, object)?)),
        RecordFilter::Or(children) => Ok(Predicate::or(compile_children(children, object)?)),
        RecordFilter::Not(child) => Ok(Predicate::negate(compile_filter(child, object)?)),
    }
}

fn compile_children(
    children: &[RecordFilter],
    object: &ObjectMetadataItem,
) -> Result<Vec<Predicate>, FilterError> {
    children.iter().map(|c| compile_filter(c, object)).collect()
}

/// Compile `filter` and append it to `query`.
///
/// Soft-deleted rows are hidden unless the filter itself mentions `deletedAt`.
pub fn apply_filter_to_builder(
    query: &mut SelectQuery,
    filter: &RecordFilter,
    object: &ObjectMetadataItem,
) -> Result<(), FilterError> {
    let predicate = compile_filter(filter, object)?;
    query.and_where(predicate);

    if object.field(DELETED_AT_FIELD).is_some() && !filter.references_field(DELETED_AT_FIELD) {
        query.and_where(Predicate::is_null(DELETED_AT_FIELD));
    }

    tracing::trace!(object = %object.name_singular, conditions = query.conditions().len(), "Filter applied");
    Ok(())
}
