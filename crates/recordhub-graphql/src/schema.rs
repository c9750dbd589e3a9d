//! Dynamic GraphQL schema generation from workspace object metadata.
//!
//! For every object `person`/`people` the schema exposes:
//!
//! - `Person`, `PersonEdge`, `PersonConnection` types
//! - `Query.people(filter, orderBy, first, after): PersonConnection!`
//! - `Query.searchPeople(searchInput, filter, limit): PersonConnection!`
//! - `Mutation.deletePeople(recordIdsToDelete: [ID!]!): [Person!]!`
//!   (not for remote objects)

use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{
    Field, FieldFuture, InputValue, Object, Scalar, Schema, SchemaBuilder, TypeRef,
};
use recordhub_core::{
    CompositePropertyKind, FieldMetadata, FieldMetadataType, ObjectMetadataItem,
    ObjectMetadataMaps, RelationType,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::GraphQLError;
use crate::resolvers::{DeleteManyResolver, FindManyResolver, SearchResolver};

/// The name of the custom JSON scalar used for filters, ordering and raw JSON fields.
pub const JSON_SCALAR: &str = "JSON";

/// Shared page info type.
pub const PAGE_INFO_TYPE: &str = "PageInfo";

/// Schema limits, read from the `[graphql]` section of `recordhub.toml`.
///
/// ```toml
/// [graphql]
/// enabled = true
/// max_depth = 15
/// max_complexity = 500
/// introspection = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaBuilderConfig {
    /// Serve the `/graphql` endpoint.
    pub enabled: bool,

    /// Maximum query depth. Every expanded relation adds two levels
    /// (the relation field and, for one-to-many, its edges).
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    pub max_complexity: usize,

    /// Whether to enable introspection queries.
    #[serde(rename = "introspection")]
    pub introspection_enabled: bool,
}

impl Default for SchemaBuilderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: 15,
            max_complexity: 500,
            introspection_enabled: true,
        }
    }
}

impl SchemaBuilderConfig {
    /// Rejects limits that would refuse every query.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        Ok(())
    }
}

/// `person` → `Person`
pub fn type_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn composite_type_name(field_type: FieldMetadataType) -> Option<&'static str> {
    match field_type {
        FieldMetadataType::FullName => Some("FullName"),
        FieldMetadataType::Currency => Some("Currency"),
        FieldMetadataType::Links => Some("Links"),
        FieldMetadataType::Emails => Some("Emails"),
        _ => None,
    }
}

/// A field resolved from the parent object value under `key`.
fn parent_value_field(name: &str, ty: TypeRef) -> Field {
    let key = name.to_string();
    Field::new(name, ty, move |ctx| {
        let key = key.clone();
        FieldFuture::new(async move {
            let value = match ctx.parent_value.as_value() {
                Some(Value::Object(obj)) => obj.get(key.as_str()).cloned(),
                _ => None,
            };
            Ok(value.filter(|v| !matches!(v, Value::Null)))
        })
    })
}

/// Builds the GraphQL schema of one workspace metadata set.
///
/// # Example
///
/// ```ignore
/// let schema = RecordSchemaBuilder::new(objects.clone(), SchemaBuilderConfig::default())
///     .build()?;
/// ```
pub struct RecordSchemaBuilder {
    objects: Arc<ObjectMetadataMaps>,
    config: SchemaBuilderConfig,
}

impl RecordSchemaBuilder {
    #[must_use]
    pub fn new(objects: Arc<ObjectMetadataMaps>, config: SchemaBuilderConfig) -> Self {
        Self { objects, config }
    }

    /// Builds the GraphQL schema.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::SchemaBuildFailed` if the metadata has no
    /// objects or async-graphql rejects the generated types.
    pub fn build(&self) -> Result<Schema, GraphQLError> {
        if self.objects.is_empty() {
            return Err(GraphQLError::SchemaBuildFailed(
                "workspace metadata has no objects".into(),
            ));
        }
        debug!(objects = self.objects.len(), "Starting GraphQL schema build");

        let has_mutations = self.objects.iter().any(|o| !o.is_remote);
        let mut builder = Schema::build("Query", has_mutations.then_some("Mutation"), None);

        builder = builder.register(Scalar::new(JSON_SCALAR).description("Arbitrary JSON value"));
        builder = builder.register(Self::page_info_type());
        builder = self.register_composite_types(builder);

        let mut query = Object::new("Query");
        let mut mutation = Object::new("Mutation");
        for object in self.objects.iter() {
            trace!(object = %object.name_singular, "Registering object types");
            builder = builder
                .register(self.record_type(object))
                .register(Self::edge_type(object))
                .register(Self::connection_type(object));

            query = query
                .field(Self::find_many_field(object))
                .field(Self::search_field(object));
            if !object.is_remote {
                mutation = mutation.field(Self::delete_many_field(object));
            }
        }

        builder = builder.register(query);
        if has_mutations {
            builder = builder.register(mutation);
        }

        let mut builder = builder
            .limit_depth(self.config.max_depth)
            .limit_complexity(self.config.max_complexity);
        if !self.config.introspection_enabled {
            builder = builder.disable_introspection();
        }

        let schema = builder
            .finish()
            .map_err(|e| GraphQLError::SchemaBuildFailed(e.to_string()))?;

        debug!("GraphQL schema build complete");
        Ok(schema)
    }

    fn page_info_type() -> Object {
        Object::new(PAGE_INFO_TYPE)
            .description("Pagination state of a connection")
            .field(parent_value_field("hasNextPage", TypeRef::named_nn(TypeRef::BOOLEAN)))
            .field(parent_value_field("hasPreviousPage", TypeRef::named_nn(TypeRef::BOOLEAN)))
            .field(parent_value_field("startCursor", TypeRef::named(TypeRef::STRING)))
            .field(parent_value_field("endCursor", TypeRef::named(TypeRef::STRING)))
    }

    fn register_composite_types(&self, mut builder: SchemaBuilder) -> SchemaBuilder {
        let mut used: Vec<FieldMetadataType> = Vec::new();
        for field in self.objects.iter().flat_map(|o| o.fields.iter()) {
            if field.is_composite() && !used.contains(&field.field_type) {
                used.push(field.field_type);
            }
        }

        for field_type in used {
            let (Some(name), Some(properties)) =
                (composite_type_name(field_type), field_type.composite_properties())
            else {
                continue;
            };
            let mut object = Object::new(name);
            for property in properties {
                let ty = match property.kind {
                    CompositePropertyKind::Text => TypeRef::named(TypeRef::STRING),
                    CompositePropertyKind::Number => TypeRef::named(TypeRef::FLOAT),
                };
                object = object.field(parent_value_field(property.name, ty));
            }
            builder = builder.register(object);
        }
        builder
    }

    fn field_type_ref(&self, field: &FieldMetadata) -> Option<TypeRef> {
        let nullable = |name: &str| {
            if field.is_nullable {
                TypeRef::named(name)
            } else {
                TypeRef::named_nn(name)
            }
        };

        if let Some(name) = composite_type_name(field.field_type) {
            return Some(TypeRef::named(name));
        }

        match field.field_type {
            FieldMetadataType::Uuid => Some(nullable(TypeRef::ID)),
            FieldMetadataType::Text | FieldMetadataType::Select | FieldMetadataType::DateTime => {
                Some(nullable(TypeRef::STRING))
            }
            FieldMetadataType::Number | FieldMetadataType::Position => {
                Some(nullable(TypeRef::FLOAT))
            }
            FieldMetadataType::Boolean => Some(nullable(TypeRef::BOOLEAN)),
            FieldMetadataType::MultiSelect => Some(TypeRef::named_nn_list(TypeRef::STRING)),
            FieldMetadataType::RawJson => Some(TypeRef::named(JSON_SCALAR)),
            FieldMetadataType::Relation => {
                let target = self.objects.relation_target(field).ok()?;
                let target_type = type_name(&target.name_singular);
                match field.relation_type()? {
                    RelationType::ManyToOne => Some(TypeRef::named(target_type)),
                    RelationType::OneToMany => {
                        Some(TypeRef::named(format!("{target_type}Connection")))
                    }
                }
            }
            FieldMetadataType::TsVector => None,
            _ => Some(TypeRef::named(JSON_SCALAR)),
        }
    }

    fn record_type(&self, object: &ObjectMetadataItem) -> Object {
        let mut record = Object::new(type_name(&object.name_singular))
            .description(format!("A {} record", object.name_singular));

        for field in &object.fields {
            let Some(ty) = self.field_type_ref(field) else {
                continue;
            };
            record = record.field(parent_value_field(&field.name, ty));

            if field.relation_type() == Some(RelationType::ManyToOne) {
                let join_column = field
                    .settings
                    .join_column_name
                    .clone()
                    .unwrap_or_else(|| field.conventional_join_column());
                if object.field(&join_column).is_none() {
                    record = record.field(parent_value_field(&join_column, TypeRef::named(TypeRef::ID)));
                }
            }
        }
        record
    }

    fn edge_type(object: &ObjectMetadataItem) -> Object {
        let record = type_name(&object.name_singular);
        Object::new(format!("{record}Edge"))
            .description(format!("Edge type for {record} connection"))
            .field(parent_value_field("node", TypeRef::named_nn(record.as_str())))
            .field(parent_value_field("cursor", TypeRef::named_nn(TypeRef::STRING)))
    }

    fn connection_type(object: &ObjectMetadataItem) -> Object {
        let record = type_name(&object.name_singular);
        Object::new(format!("{record}Connection"))
            .description(format!("A page of {record} records"))
            .field(parent_value_field(
                "edges",
                TypeRef::named_nn_list_nn(format!("{record}Edge")),
            ))
            .field(parent_value_field("pageInfo", TypeRef::named_nn(PAGE_INFO_TYPE)))
            .field(parent_value_field("totalCount", TypeRef::named_nn(TypeRef::INT)))
    }

    fn find_many_field(object: &ObjectMetadataItem) -> Field {
        let connection = format!("{}Connection", type_name(&object.name_singular));
        Field::new(
            object.name_plural.clone(),
            TypeRef::named_nn(connection),
            FindManyResolver::resolve(object.name_singular.clone()),
        )
        .description(format!("List {} records", object.name_plural))
        .argument(InputValue::new("filter", TypeRef::named(JSON_SCALAR)))
        .argument(InputValue::new("orderBy", TypeRef::named(JSON_SCALAR)))
        .argument(InputValue::new("first", TypeRef::named(TypeRef::INT)))
        .argument(InputValue::new("after", TypeRef::named(TypeRef::STRING)))
    }

    fn search_field(object: &ObjectMetadataItem) -> Field {
        let connection = format!("{}Connection", type_name(&object.name_singular));
        Field::new(
            format!("search{}", type_name(&object.name_plural)),
            TypeRef::named_nn(connection),
            SearchResolver::resolve(object.name_singular.clone()),
        )
        .description(format!("Full-text search over {} records", object.name_plural))
        .argument(InputValue::new("searchInput", TypeRef::named(TypeRef::STRING)))
        .argument(InputValue::new("filter", TypeRef::named(JSON_SCALAR)))
        .argument(InputValue::new("limit", TypeRef::named(TypeRef::INT)))
    }

    fn delete_many_field(object: &ObjectMetadataItem) -> Field {
        Field::new(
            format!("delete{}", type_name(&object.name_plural)),
            TypeRef::named_nn_list_nn(type_name(&object.name_singular)),
            DeleteManyResolver::resolve(object.name_singular.clone()),
        )
        .description(format!("Soft-delete {} records", object.name_plural))
        .argument(InputValue::new(
            "recordIdsToDelete",
            TypeRef::named_nn_list_nn(TypeRef::ID),
        ))
    }
}
