//! Relation selection sets.
//!
//! A [`RelationSelection`] names the relation fields a client asked for,
//! recursively. It is derived from the GraphQL selection set and drives the
//! nested relation expander.

use std::collections::BTreeMap;

use async_graphql::SelectionField;
use recordhub_core::{ObjectMetadataItem, ObjectMetadataMaps, RelationType};

/// Requested relations of one object, keyed by relation field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationSelection {
    relations: BTreeMap<String, RelationSelection>,
}

impl RelationSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a relation with its own nested selection.
    #[must_use]
    pub fn with(mut self, relation: impl Into<String>, nested: RelationSelection) -> Self {
        self.relations.insert(relation.into(), nested);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RelationSelection)> {
        self.relations.iter().map(|(name, nested)| (name.as_str(), nested))
    }

    /// Collects relations from the fields selected on a record.
    pub fn from_record_fields<'a>(
        object: &ObjectMetadataItem,
        objects: &ObjectMetadataMaps,
        fields: impl Iterator<Item = SelectionField<'a>>,
    ) -> Self {
        let mut selection = Self::new();
        for selected in fields {
            let Some(field) = object.field(selected.name()) else {
                continue;
            };
            let Some(relation_type) = field.relation_type() else {
                continue;
            };
            let Ok(target) = objects.relation_target(field) else {
                continue;
            };
            let nested = match relation_type {
                RelationType::ManyToOne => {
                    Self::from_record_fields(target, objects, selected.selection_set())
                }
                RelationType::OneToMany => Self::from_connection_field(target, objects, selected),
            };
            selection.relations.insert(field.name.clone(), nested);
        }
        selection
    }

    /// Collects relations below `edges { node { ... } }` of a connection field.
    pub fn from_connection_field(
        object: &ObjectMetadataItem,
        objects: &ObjectMetadataMaps,
        connection: SelectionField<'_>,
    ) -> Self {
        let mut selection = Self::new();
        for edges in connection.selection_set().filter(|f| f.name() == "edges") {
            for node in edges.selection_set().filter(|f| f.name() == "node") {
                let nested = Self::from_record_fields(object, objects, node.selection_set());
                selection.relations.extend(nested.relations);
            }
        }
        selection
    }
}

/// Whether `totalCount` is selected on a connection field.
pub fn selects_total_count(connection: SelectionField<'_>) -> bool {
    connection
        .selection_set()
        .any(|field| field.name() == "totalCount")
}
