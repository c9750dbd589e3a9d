//! Declarative record filter tree.
//!
//! Filters arrive as GraphQL JSON input of the form
//!
//! ```json
//! {
//!   "and": [{ "city": { "eq": "Paris" } }],
//!   "or": [{ "name": { "firstName": { "ilike": "%jo%" } } }],
//!   "not": { "status": { "in": ["closed"] } }
//! }
//! ```
//!
//! and are parsed into a [`RecordFilter`]. Operators are kept as strings here;
//! the query compiler decides which ones it supports.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// A single `field [subField] operator value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterLeaf {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_field: Option<String>,
    pub operator: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordFilter {
    Leaf(FilterLeaf),
    And(Vec<RecordFilter>),
    Or(Vec<RecordFilter>),
    Not(Box<RecordFilter>),
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::empty()
    }
}

impl RecordFilter {
    /// The filter that matches everything.
    pub fn empty() -> Self {
        Self::And(Vec::new())
    }

    pub fn leaf(field: impl Into<String>, operator: impl Into<String>, value: Value) -> Self {
        Self::Leaf(FilterLeaf {
            field: field.into(),
            sub_field: None,
            operator: operator.into(),
            value,
        })
    }

    pub fn composite(
        field: impl Into<String>,
        sub_field: impl Into<String>,
        operator: impl Into<String>,
        value: Value,
    ) -> Self {
        Self::Leaf(FilterLeaf {
            field: field.into(),
            sub_field: Some(sub_field.into()),
            operator: operator.into(),
            value,
        })
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::leaf(field, "eq", value)
    }

    /// `id in [...]`
    pub fn in_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids.into_iter().map(|id| Value::String(id.into())).collect();
        Self::leaf("id", "in", Value::Array(ids))
    }

    pub fn and(children: Vec<RecordFilter>) -> Self {
        Self::And(children)
    }

    pub fn or(children: Vec<RecordFilter>) -> Self {
        Self::Or(children)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: RecordFilter) -> Self {
        Self::Not(Box::new(child))
    }

    /// Combine with another filter under AND, flattening empty operands.
    pub fn and_with(self, other: RecordFilter) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other,
            (_, true) => self,
            _ => match self {
                Self::And(mut children) => {
                    children.push(other);
                    Self::And(children)
                }
                first => Self::And(vec![first, other]),
            },
        }
    }

    /// True when the filter places no restriction on rows.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Leaf(_) => false,
            Self::And(children) => children.iter().all(Self::is_empty),
            // One unrestricted branch lets every row through.
            Self::Or(children) => children.is_empty() || children.iter().any(Self::is_empty),
            Self::Not(_) => false,
        }
    }

    /// Whether any leaf in the tree targets `field`.
    pub fn references_field(&self, field: &str) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.field == field,
            Self::And(children) | Self::Or(children) => {
                children.iter().any(|c| c.references_field(field))
            }
            Self::Not(child) => child.references_field(field),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::And(children) | Self::Or(children) => {
                children.iter().map(Self::leaf_count).sum()
            }
            Self::Not(child) => child.leaf_count(),
        }
    }

    /// Parse the GraphQL JSON filter input.
    ///
    /// Keys in one object are combined with AND. A `null` input is the empty filter.
    pub fn from_json(value: &Value) -> Result<Self, CoreError> {
        match value {
            Value::Null => Ok(Self::empty()),
            Value::Object(map) => parse_object(map),
            other => Err(CoreError::invalid_filter(format!(
                "filter must be an object, got {other}"
            ))),
        }
    }

    /// Render back into the GraphQL JSON filter shape.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Leaf(leaf) => {
                let mut op = Map::new();
                op.insert(leaf.operator.clone(), leaf.value.clone());
                let inner = match &leaf.sub_field {
                    Some(sub) => {
                        let mut composite = Map::new();
                        composite.insert(sub.clone(), Value::Object(op));
                        Value::Object(composite)
                    }
                    None => Value::Object(op),
                };
                let mut outer = Map::new();
                outer.insert(leaf.field.clone(), inner);
                Value::Object(outer)
            }
            Self::And(children) => combinator_json("and", children),
            Self::Or(children) => combinator_json("or", children),
            Self::Not(child) => {
                let mut outer = Map::new();
                outer.insert("not".to_string(), child.to_json());
                Value::Object(outer)
            }
        }
    }
}

fn combinator_json(key: &str, children: &[RecordFilter]) -> Value {
    let mut outer = Map::new();
    outer.insert(
        key.to_string(),
        Value::Array(children.iter().map(RecordFilter::to_json).collect()),
    );
    Value::Object(outer)
}

fn parse_object(map: &Map<String, Value>) -> Result<RecordFilter, CoreError> {
    let mut parts = Vec::with_capacity(map.len());

    for (key, value) in map {
        match key.as_str() {
            "and" | "or" => {
                let items = value.as_array().ok_or_else(|| {
                    CoreError::invalid_filter(format!("'{key}' expects an array"))
                })?;
                let children = items
                    .iter()
                    .map(RecordFilter::from_json)
                    .collect::<Result<Vec<_>, _>>()?;
                parts.push(if key == "and" {
                    RecordFilter::And(children)
                } else {
                    RecordFilter::Or(children)
                });
            }
            "not" => parts.push(RecordFilter::not(RecordFilter::from_json(value)?)),
            field => parts.extend(parse_field(field, value)?),
        }
    }

    Ok(match parts.len() {
        1 => parts.remove(0),
        _ => RecordFilter::And(parts),
    })
}

fn parse_field(field: &str, value: &Value) -> Result<Vec<RecordFilter>, CoreError> {
    let ops = value.as_object().ok_or_else(|| {
        CoreError::invalid_filter(format!("field '{field}' expects an operator object"))
    })?;
    if ops.is_empty() {
        return Err(CoreError::invalid_filter(format!(
            "field '{field}' has no operator"
        )));
    }

    let mut leaves = Vec::with_capacity(ops.len());
    for (key, operand) in ops {
        match operand {
            // Nested object: composite sub-field with its own operators.
            Value::Object(sub_ops) => {
                if sub_ops.is_empty() {
                    return Err(CoreError::invalid_filter(format!(
                        "sub-field '{field}.{key}' has no operator"
                    )));
                }
                for (op, v) in sub_ops {
                    leaves.push(RecordFilter::composite(field, key.as_str(), op.as_str(), v.clone()));
                }
            }
            _ => leaves.push(RecordFilter::leaf(field, key.as_str(), operand.clone())),
        }
    }
    Ok(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_simple_leaf() {
        let filter = RecordFilter::from_json(&json!({"status": {"eq": "open"}})).unwrap();
        assert_eq!(filter, RecordFilter::eq("status", json!("open")));
    }

    #[test]
    fn test_parse_composite_and_combinators() {
        let filter = RecordFilter::from_json(&json!({
            "or": [
                {"name": {"firstName": {"ilike": "%jo%"}}},
                {"not": {"city": {"in": ["Paris", "Lyon"]}}}
            ]
        }))
        .unwrap();

        let RecordFilter::Or(children) = &filter else {
            panic!("expected or, got {filter:?}");
        };
        assert_eq!(
            children[0],
            RecordFilter::composite("name", "firstName", "ilike", json!("%jo%"))
        );
        assert!(matches!(children[1], RecordFilter::Not(_)));
        assert_eq!(filter.leaf_count(), 2);
    }

    #[test]
    fn test_multiple_keys_combine_with_and() {
        let filter = RecordFilter::from_json(&json!({
            "city": {"eq": "Paris"},
            "age": {"gte": 18, "lt": 65}
        }))
        .unwrap();
        let RecordFilter::And(children) = filter else {
            panic!("expected and");
        };
        assert_eq!(children.len(), 3);
    }

    #[test]
    fn test_null_is_empty() {
        let filter = RecordFilter::from_json(&Value::Null).unwrap();
        assert!(filter.is_empty());
        assert!(RecordFilter::and(vec![RecordFilter::or(vec![])]).is_empty());
    }

    #[test]
    fn test_restricting_trees_are_not_empty() {
        let paris = RecordFilter::eq("city", json!("Paris"));
        assert!(RecordFilter::or(vec![RecordFilter::empty(), paris.clone()]).is_empty());
        assert!(!RecordFilter::and(vec![RecordFilter::empty(), paris]).is_empty());
        assert!(!RecordFilter::not(RecordFilter::empty()).is_empty());
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(RecordFilter::from_json(&json!([1])).is_err());
        assert!(RecordFilter::from_json(&json!({"and": {}})).is_err());
        assert!(RecordFilter::from_json(&json!({"city": "Paris"})).is_err());
        assert!(RecordFilter::from_json(&json!({"city": {}})).is_err());
    }

    #[test]
    fn test_references_field() {
        let filter = RecordFilter::and(vec![
            RecordFilter::eq("city", json!("Paris")),
            RecordFilter::not(RecordFilter::leaf("deletedAt", "is", json!("NULL"))),
        ]);
        assert!(filter.references_field("deletedAt"));
        assert!(!filter.references_field("name"));
    }

    #[test]
    fn test_and_with_flattens() {
        let base = RecordFilter::empty().and_with(RecordFilter::eq("a", json!(1)));
        assert_eq!(base, RecordFilter::eq("a", json!(1)));

        let combined = RecordFilter::and(vec![RecordFilter::eq("a", json!(1))])
            .and_with(RecordFilter::eq("b", json!(2)));
        assert_eq!(combined.leaf_count(), 2);
        assert!(matches!(combined, RecordFilter::And(ref c) if c.len() == 2));
    }

    #[test]
    fn test_json_shape_survives_rendering() {
        let input = json!({"or": [{"name": {"lastName": {"eq": "Doe"}}}, {"not": {"id": {"in": ["x"]}}}]});
        let filter = RecordFilter::from_json(&input).unwrap();
        assert_eq!(filter.to_json(), input);
    }
}
