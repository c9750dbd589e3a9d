//! Connection assembly.
//!
//! Shapes an already fetched, already ordered record list into a
//! cursor-paginated connection. Page flags are supplied by the caller; this
//! step never recomputes cursor positions.

use recordhub_core::{ObjectMetadataItem, ObjectMetadataMaps, ObjectRecord, RelationType};
use serde::Serialize;
use serde_json::Value;

use super::cursor::CursorData;
use super::order::OrderField;

/// Relay-style page info.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub node: Value,
    pub cursor: String,
}

/// A page of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
    pub total_count: u64,
}

impl Connection {
    /// No edges, zero count, no further pages.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Value> {
        self.edges.iter().map(|edge| &edge.node)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Inputs of one connection besides its records.
#[derive(Debug, Clone)]
pub struct ConnectionParams<'a> {
    pub take: usize,
    pub total_count: u64,
    pub order: &'a [OrderField],
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

/// Builds connections, including nested one-to-many relation connections.
pub struct ConnectionAssembler<'a> {
    objects: &'a ObjectMetadataMaps,
    relation_take: usize,
}

impl<'a> ConnectionAssembler<'a> {
    /// `relation_take` bounds the edges of nested relation connections.
    pub fn new(objects: &'a ObjectMetadataMaps, relation_take: usize) -> Self {
        Self {
            objects,
            relation_take,
        }
    }

    pub fn assemble(
        &self,
        object: &ObjectMetadataItem,
        records: Vec<ObjectRecord>,
        params: &ConnectionParams<'_>,
    ) -> Connection {
        let edges: Vec<Edge> = records
            .into_iter()
            .take(params.take)
            .map(|record| {
                let cursor = CursorData::from_record(&record.fields, params.order).encode();
                Edge {
                    node: self.shape_node(object, record.fields),
                    cursor,
                }
            })
            .collect();

        Connection {
            page_info: PageInfo {
                has_next_page: params.has_next_page,
                has_previous_page: params.has_previous_page,
                start_cursor: edges.first().map(|e| e.cursor.clone()),
                end_cursor: edges.last().map(|e| e.cursor.clone()),
            },
            edges,
            total_count: params.total_count,
        }
    }

    /// Replaces attached one-to-many arrays with nested connections.
    fn shape_node(&self, object: &ObjectMetadataItem, mut fields: serde_json::Map<String, Value>) -> Value {
        for field in object.relation_fields() {
            let Some(target) = self.objects.relation_target(field).ok() else {
                continue;
            };
            match (field.relation_type(), fields.get_mut(&field.name)) {
                (Some(RelationType::OneToMany), Some(slot @ Value::Array(_))) => {
                    let Value::Array(children) = std::mem::take(slot) else {
                        continue;
                    };
                    let total_count = children.len() as u64;
                    let records = children
                        .into_iter()
                        .filter_map(|child| match child {
                            Value::Object(map) => Some(ObjectRecord::new(target.name_singular.clone(), map)),
                            _ => None,
                        })
                        .collect();
                    let nested = self.assemble(
                        target,
                        records,
                        &ConnectionParams {
                            take: self.relation_take,
                            total_count,
                            order: &[OrderField::id()],
                            has_next_page: false,
                            has_previous_page: false,
                        },
                    );
                    *slot = nested.to_json();
                }
                (Some(RelationType::ManyToOne), Some(slot @ Value::Object(_))) => {
                    let Value::Object(parent) = std::mem::take(slot) else {
                        continue;
                    };
                    *slot = self.shape_node(target, parent);
                }
                _ => {}
            }
        }
        Value::Object(fields)
    }
}
