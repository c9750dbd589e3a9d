//! `orderBy` argument parsing.

use std::str::FromStr;

use recordhub_core::ObjectMetadataItem;
use recordhub_query::{NullsOrder, OrderByExpr, SortOrder, resolve_column};
use serde_json::Value;

use crate::error::GraphQLError;

/// Direction of one ordering term, as sent by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    AscNullsFirst,
    AscNullsLast,
    DescNullsFirst,
    DescNullsLast,
}

impl OrderByDirection {
    pub fn sort_order(self) -> SortOrder {
        match self {
            Self::AscNullsFirst | Self::AscNullsLast => SortOrder::Asc,
            Self::DescNullsFirst | Self::DescNullsLast => SortOrder::Desc,
        }
    }

    pub fn nulls(self) -> NullsOrder {
        match self {
            Self::AscNullsFirst | Self::DescNullsFirst => NullsOrder::First,
            Self::AscNullsLast | Self::DescNullsLast => NullsOrder::Last,
        }
    }
}

impl FromStr for OrderByDirection {
    type Err = GraphQLError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AscNullsFirst" => Ok(Self::AscNullsFirst),
            "AscNullsLast" => Ok(Self::AscNullsLast),
            "DescNullsFirst" => Ok(Self::DescNullsFirst),
            "DescNullsLast" => Ok(Self::DescNullsLast),
            other => Err(GraphQLError::InvalidQuery(format!(
                "unknown order direction '{other}'"
            ))),
        }
    }
}

/// One resolved ordering term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderField {
    pub field: String,
    pub sub_field: Option<String>,
    pub column: String,
    pub direction: OrderByDirection,
}

impl OrderField {
    /// The `id ASC` term that closes every ordering.
    pub fn id() -> Self {
        Self {
            field: "id".to_string(),
            sub_field: None,
            column: "id".to_string(),
            direction: OrderByDirection::AscNullsFirst,
        }
    }

    fn resolve(
        object: &ObjectMetadataItem,
        field: &str,
        sub_field: Option<&str>,
        direction: &Value,
    ) -> Result<Self, GraphQLError> {
        let direction = direction
            .as_str()
            .ok_or_else(|| GraphQLError::InvalidQuery(format!("order direction of '{field}' must be a string")))?
            .parse()?;
        let resolved = resolve_column(object, field, sub_field)?;
        Ok(Self {
            field: field.to_string(),
            sub_field: sub_field.map(str::to_string),
            column: resolved.column,
            direction,
        })
    }

    /// Parses `[{"city": "AscNullsLast"}, {"name": {"lastName": "DescNullsFirst"}}]`.
    ///
    /// A single object is accepted as a one-element list. The result always
    /// ends with `id` so the ordering is total.
    pub fn parse_list(value: Option<&Value>, object: &ObjectMetadataItem) -> Result<Vec<Self>, GraphQLError> {
        let entries: Vec<&Value> = match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single @ Value::Object(_)) => vec![single],
            Some(other) => {
                return Err(GraphQLError::InvalidQuery(format!(
                    "orderBy must be a list of objects, got {other}"
                )));
            }
        };

        let mut fields = Vec::new();
        for entry in entries {
            let Value::Object(map) = entry else {
                return Err(GraphQLError::InvalidQuery("orderBy entries must be objects".into()));
            };
            for (field, direction) in map {
                match direction {
                    Value::Object(subs) => {
                        for (sub, sub_direction) in subs {
                            fields.push(Self::resolve(object, field, Some(sub), sub_direction)?);
                        }
                    }
                    _ => fields.push(Self::resolve(object, field, None, direction)?),
                }
            }
        }

        if !fields.iter().any(|f| f.column == "id") {
            fields.push(Self::id());
        }
        Ok(fields)
    }

    pub fn to_order_by(&self) -> OrderByExpr {
        OrderByExpr::Column {
            column: self.column.clone(),
            order: self.direction.sort_order(),
            nulls: self.direction.nulls(),
        }
    }

    /// Reads this term's value from a formatted record.
    ///
    /// Relation terms read the join column; the field itself may hold the
    /// expanded related record.
    pub fn value_of<'a>(&self, record: &'a serde_json::Map<String, Value>) -> Option<&'a Value> {
        match &self.sub_field {
            Some(sub) => record.get(&self.field)?.get(sub),
            None if self.column != self.field => record.get(&self.column),
            None => record.get(&self.field),
        }
    }
}
