//! Object and field metadata for workspace schemas.
//!
//! Every workspace defines its own set of objects (e.g. `person`, `company`)
//! with dynamically typed fields. The [`ObjectMetadataMaps`] registry maps
//! object ids to their [`ObjectMetadataItem`] and is resolved once per request,
//! then passed explicitly to the filter compiler, resolvers and formatter.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::{DELETED_AT_FIELD, SEARCH_VECTOR_FIELD};

/// Field types known to the query layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldMetadataType {
    Uuid,
    Text,
    Number,
    Boolean,
    DateTime,
    Select,
    MultiSelect,
    Position,
    RawJson,
    TsVector,
    Relation,
    FullName,
    Currency,
    Links,
    Emails,
}

/// Storage kind of a composite sub-field column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositePropertyKind {
    Text,
    Number,
}

/// A sub-field of a composite field, stored in its own column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeProperty {
    pub name: &'static str,
    pub kind: CompositePropertyKind,
}

const fn text(name: &'static str) -> CompositeProperty {
    CompositeProperty {
        name,
        kind: CompositePropertyKind::Text,
    }
}

const fn number(name: &'static str) -> CompositeProperty {
    CompositeProperty {
        name,
        kind: CompositePropertyKind::Number,
    }
}

const FULL_NAME_PROPERTIES: &[CompositeProperty] = &[text("firstName"), text("lastName")];
const CURRENCY_PROPERTIES: &[CompositeProperty] = &[number("amountMicros"), text("currencyCode")];
const LINKS_PROPERTIES: &[CompositeProperty] = &[text("primaryLinkUrl"), text("primaryLinkLabel")];
const EMAILS_PROPERTIES: &[CompositeProperty] = &[text("primaryEmail")];

impl FieldMetadataType {
    /// Sub-field layout for composite types, `None` for scalar types.
    pub fn composite_properties(self) -> Option<&'static [CompositeProperty]> {
        match self {
            Self::FullName => Some(FULL_NAME_PROPERTIES),
            Self::Currency => Some(CURRENCY_PROPERTIES),
            Self::Links => Some(LINKS_PROPERTIES),
            Self::Emails => Some(EMAILS_PROPERTIES),
            _ => None,
        }
    }

    pub fn is_composite(self) -> bool {
        self.composite_properties().is_some()
    }
}

/// Relation cardinality, seen from the field's own object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    /// This object holds the join column (e.g. `person.company`).
    ManyToOne,
    /// The target object holds a join column pointing back here (e.g. `company.people`).
    OneToMany,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationMetadata {
    pub relation_type: RelationType,
    pub target_object_name_singular: String,
    /// Name of the field on the target object that points back.
    #[serde(default)]
    pub inverse_field_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSettings {
    /// Explicit join column for MANY_TO_ONE relations.
    #[serde(default)]
    pub join_column_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldMetadataType,
    #[serde(default = "default_nullable")]
    pub is_nullable: bool,
    #[serde(default)]
    pub relation: Option<RelationMetadata>,
    #[serde(default)]
    pub settings: FieldSettings,
}

fn default_nullable() -> bool {
    true
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, field_type: FieldMetadataType) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            field_type,
            is_nullable: true,
            relation: None,
            settings: FieldSettings::default(),
        }
    }

    /// Create a MANY_TO_ONE relation field targeting `target`.
    pub fn many_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldMetadataType::Relation);
        field.relation = Some(RelationMetadata {
            relation_type: RelationType::ManyToOne,
            target_object_name_singular: target.into(),
            inverse_field_name: None,
        });
        field
    }

    /// Create a ONE_TO_MANY relation field whose children point back through `inverse`.
    pub fn one_to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        inverse: impl Into<String>,
    ) -> Self {
        let mut field = Self::new(name, FieldMetadataType::Relation);
        field.relation = Some(RelationMetadata {
            relation_type: RelationType::OneToMany,
            target_object_name_singular: target.into(),
            inverse_field_name: Some(inverse.into()),
        });
        field
    }

    pub fn required(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn with_join_column(mut self, column: impl Into<String>) -> Self {
        self.settings.join_column_name = Some(column.into());
        self
    }

    pub fn is_composite(&self) -> bool {
        self.field_type.is_composite()
    }

    pub fn is_relation(&self) -> bool {
        self.field_type == FieldMetadataType::Relation && self.relation.is_some()
    }

    pub fn relation_type(&self) -> Option<RelationType> {
        self.relation.as_ref().map(|r| r.relation_type)
    }

    /// Join column derived by naming convention: `{field}Id`.
    pub fn conventional_join_column(&self) -> String {
        format!("{}Id", self.name)
    }

    /// Column holding a composite sub-field, e.g. `name` + `firstName` → `nameFirstName`.
    pub fn composite_column(&self, sub_field: &str) -> Option<String> {
        let properties = self.field_type.composite_properties()?;
        properties
            .iter()
            .find(|p| p.name == sub_field)
            .map(|p| composite_column_name(&self.name, p.name))
    }

    pub fn composite_property(&self, sub_field: &str) -> Option<CompositeProperty> {
        self.field_type
            .composite_properties()?
            .iter()
            .find(|p| p.name == sub_field)
            .copied()
    }
}

/// Build the flat column name for a composite sub-field.
pub fn composite_column_name(field: &str, sub_field: &str) -> String {
    let mut chars = sub_field.chars();
    match chars.next() {
        Some(first) => format!("{field}{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => field.to_string(),
    }
}

/// Describes one object type of a workspace schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadataItem {
    #[serde(default)]
    pub id: String,
    pub name_singular: String,
    pub name_plural: String,
    /// Backed by an external system; excluded from mutations.
    #[serde(default)]
    pub is_remote: bool,
    /// Fields concatenated into the `searchVector` column.
    #[serde(default)]
    pub search_vector_fields: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldMetadata>,
}

impl ObjectMetadataItem {
    /// Create an object with the standard system fields.
    pub fn new(name_singular: impl Into<String>, name_plural: impl Into<String>) -> Self {
        let name_singular = name_singular.into();
        let mut item = Self {
            id: name_singular.clone(),
            name_singular,
            name_plural: name_plural.into(),
            is_remote: false,
            search_vector_fields: Vec::new(),
            fields: Vec::new(),
        };
        item.ensure_standard_fields();
        item
    }

    pub fn with_field(mut self, field: FieldMetadata) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    /// Make the object searchable over the given fields.
    pub fn with_search_vector(mut self, fields: &[&str]) -> Self {
        self.search_vector_fields = fields.iter().map(|f| (*f).to_string()).collect();
        self.ensure_standard_fields();
        self
    }

    pub fn remote(mut self) -> Self {
        self.is_remote = true;
        self
    }

    /// Add the system fields every workspace table carries.
    pub fn ensure_standard_fields(&mut self) {
        let mut standard = vec![
            FieldMetadata::new("id", FieldMetadataType::Uuid).required(),
            FieldMetadata::new("createdAt", FieldMetadataType::DateTime).required(),
            FieldMetadata::new("updatedAt", FieldMetadataType::DateTime).required(),
            FieldMetadata::new(DELETED_AT_FIELD, FieldMetadataType::DateTime),
        ];
        if !self.search_vector_fields.is_empty() {
            standard.push(FieldMetadata::new(
                SEARCH_VECTOR_FIELD,
                FieldMetadataType::TsVector,
            ));
        }
        for field in standard.into_iter().rev() {
            if self.field(&field.name).is_none() {
                self.fields.insert(0, field);
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn require_field(&self, name: &str) -> Result<&FieldMetadata, CoreError> {
        self.field(name)
            .ok_or_else(|| CoreError::field_not_found(&self.name_singular, name))
    }

    /// Field owning a MANY_TO_ONE join column such as `companyId`.
    pub fn field_by_join_column(&self, column: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| {
            f.relation_type() == Some(RelationType::ManyToOne)
                && (f.settings.join_column_name.as_deref() == Some(column)
                    || f.conventional_join_column() == column)
        })
    }

    pub fn has_search_vector(&self) -> bool {
        self.field(SEARCH_VECTOR_FIELD).is_some()
    }

    pub fn relation_fields(&self) -> impl Iterator<Item = &FieldMetadata> {
        self.fields.iter().filter(|f| f.is_relation())
    }

    fn validate(&self) -> Result<(), CoreError> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(CoreError::invalid_metadata(format!(
                    "duplicate field '{}' on object '{}'",
                    field.name, self.name_singular
                )));
            }
            if field.field_type == FieldMetadataType::Relation && field.relation.is_none() {
                return Err(CoreError::invalid_metadata(format!(
                    "relation field '{}' on object '{}' has no relation metadata",
                    field.name, self.name_singular
                )));
            }
        }
        for name in &self.search_vector_fields {
            if self.field(name).is_none() {
                return Err(CoreError::invalid_metadata(format!(
                    "search vector field '{name}' missing on object '{}'",
                    self.name_singular
                )));
            }
        }
        Ok(())
    }
}

/// Registry of a workspace's objects, keyed by object id.
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadataMaps {
    by_id: IndexMap<String, ObjectMetadataItem>,
    id_by_name_singular: HashMap<String, String>,
}

impl ObjectMetadataMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, adding standard fields and validating every item.
    pub fn from_items(items: Vec<ObjectMetadataItem>) -> Result<Self, CoreError> {
        let mut maps = Self::new();
        for item in items {
            maps.insert(item)?;
        }
        maps.validate_relations()?;
        Ok(maps)
    }

    /// Parse a JSON array of object metadata items.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let items: Vec<ObjectMetadataItem> = serde_json::from_str(json)?;
        Self::from_items(items)
    }

    pub fn insert(&mut self, mut item: ObjectMetadataItem) -> Result<(), CoreError> {
        if item.id.is_empty() {
            item.id = item.name_singular.clone();
        }
        item.ensure_standard_fields();
        item.validate()?;

        if self.id_by_name_singular.contains_key(&item.name_singular) {
            return Err(CoreError::invalid_metadata(format!(
                "duplicate object '{}'",
                item.name_singular
            )));
        }

        self.id_by_name_singular
            .insert(item.name_singular.clone(), item.id.clone());
        self.by_id.insert(item.id.clone(), item);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ObjectMetadataItem> {
        self.by_id.get(id)
    }

    pub fn get_by_name_singular(&self, name: &str) -> Option<&ObjectMetadataItem> {
        self.id_by_name_singular
            .get(name)
            .and_then(|id| self.by_id.get(id))
    }

    pub fn require_by_name_singular(&self, name: &str) -> Result<&ObjectMetadataItem, CoreError> {
        self.get_by_name_singular(name)
            .ok_or_else(|| CoreError::object_not_found(name))
    }

    /// Resolve the target object of a relation field.
    pub fn relation_target(&self, field: &FieldMetadata) -> Result<&ObjectMetadataItem, CoreError> {
        let relation = field.relation.as_ref().ok_or_else(|| {
            CoreError::invalid_metadata(format!("field '{}' is not a relation", field.name))
        })?;
        self.require_by_name_singular(&relation.target_object_name_singular)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectMetadataItem> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn validate_relations(&self) -> Result<(), CoreError> {
        for item in self.by_id.values() {
            for field in item.relation_fields() {
                let target = self.relation_target(field)?;
                if let Some(relation) = &field.relation
                    && relation.relation_type == RelationType::OneToMany
                {
                    let inverse = relation.inverse_field_name.as_deref().ok_or_else(|| {
                        CoreError::invalid_metadata(format!(
                            "one-to-many field '{}.{}' has no inverse field",
                            item.name_singular, field.name
                        ))
                    })?;
                    if target.field(inverse).is_none() {
                        return Err(CoreError::invalid_metadata(format!(
                            "inverse field '{inverse}' missing on object '{}'",
                            target.name_singular
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> ObjectMetadataItem {
        ObjectMetadataItem::new("person", "people")
            .with_field(FieldMetadata::new("name", FieldMetadataType::FullName))
            .with_field(FieldMetadata::new("city", FieldMetadataType::Text))
            .with_field(FieldMetadata::many_to_one("company", "company"))
            .with_search_vector(&["name"])
    }

    fn company() -> ObjectMetadataItem {
        ObjectMetadataItem::new("company", "companies")
            .with_field(FieldMetadata::new("name", FieldMetadataType::Text))
            .with_field(FieldMetadata::one_to_many("people", "person", "company"))
    }

    #[test]
    fn test_standard_fields_present() {
        let item = person();
        assert!(item.field("id").is_some());
        assert!(item.field("deletedAt").is_some());
        assert!(item.has_search_vector());
        assert!(!company().has_search_vector());
    }

    #[test]
    fn test_composite_column() {
        let item = person();
        let name = item.field("name").unwrap();
        assert_eq!(name.composite_column("firstName").as_deref(), Some("nameFirstName"));
        assert!(name.composite_column("middleName").is_none());
    }

    #[test]
    fn test_field_by_join_column() {
        let item = person();
        assert_eq!(item.field_by_join_column("companyId").unwrap().name, "company");
        assert!(item.field_by_join_column("cityId").is_none());
    }

    #[test]
    fn test_registry_lookup() {
        let maps = ObjectMetadataMaps::from_items(vec![person(), company()]).unwrap();
        assert_eq!(maps.len(), 2);
        let person = maps.get_by_name_singular("person").unwrap();
        let target = maps.relation_target(person.field("company").unwrap()).unwrap();
        assert_eq!(target.name_plural, "companies");
        assert!(maps.require_by_name_singular("opportunity").is_err());
    }

    #[test]
    fn test_registry_rejects_dangling_relation() {
        let result = ObjectMetadataMaps::from_items(vec![person()]);
        assert!(matches!(result, Err(CoreError::ObjectNotFound(_))));
    }

    #[test]
    fn test_registry_rejects_duplicate_object() {
        let result = ObjectMetadataMaps::from_items(vec![company(), company()]);
        assert!(matches!(result, Err(CoreError::InvalidMetadata(_))));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {
                "nameSingular": "company",
                "namePlural": "companies",
                "searchVectorFields": ["name"],
                "fields": [
                    { "name": "name", "type": "TEXT" },
                    { "name": "employees", "type": "NUMBER" },
                    { "name": "address", "type": "LINKS" }
                ]
            }
        ]"#;
        let maps = ObjectMetadataMaps::from_json(json).unwrap();
        let company = maps.get("company").unwrap();
        assert!(company.has_search_vector());
        assert_eq!(
            company.field("employees").unwrap().field_type,
            FieldMetadataType::Number
        );
        assert!(company.field("address").unwrap().is_composite());
    }
}
