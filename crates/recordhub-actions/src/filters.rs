//! View filters and targeted-record rules.
//!
//! A view stores filters as `(field, operand, value)` triples edited in the
//! UI. Combined with the selection rule they yield the [`RecordFilter`]
//! sent to the list query.

use recordhub_core::{DELETED_AT_FIELD, ObjectMetadataItem, RecordFilter};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{ActionError, Result};

/// Comparison chosen in the view filter dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewFilterOperand {
    Is,
    IsNot,
    Contains,
    DoesNotContain,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewFilter {
    pub field_name: String,
    /// Sub-field of a composite field, e.g. `firstName` of `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_field_name: Option<String>,
    pub operand: ViewFilterOperand,
    #[serde(default)]
    pub value: Value,
}

impl ViewFilter {
    pub fn new(field_name: impl Into<String>, operand: ViewFilterOperand, value: Value) -> Self {
        Self {
            field_name: field_name.into(),
            sub_field_name: None,
            operand,
            value,
        }
    }

    pub fn with_sub_field(mut self, sub_field: impl Into<String>) -> Self {
        self.sub_field_name = Some(sub_field.into());
        self
    }

    /// Filters on `deletedAt` select soft-deleted rows.
    pub fn is_soft_delete_filter(&self) -> bool {
        self.field_name == DELETED_AT_FIELD
    }

    fn leaf(&self, operator: &str, value: Value) -> RecordFilter {
        match &self.sub_field_name {
            Some(sub) => RecordFilter::composite(&self.field_name, sub, operator, value),
            None => RecordFilter::leaf(&self.field_name, operator, value),
        }
    }

    /// Compile into a record filter for `object`.
    pub fn to_record_filter(&self, object: &ObjectMetadataItem) -> Result<RecordFilter> {
        if object.field(&self.field_name).is_none() {
            return Err(ActionError::invalid_filter(
                &self.field_name,
                format!("no such field on '{}'", object.name_singular),
            ));
        }

        let filter = match self.operand {
            ViewFilterOperand::Is => self.equality(),
            ViewFilterOperand::IsNot => RecordFilter::not(self.equality()),
            ViewFilterOperand::Contains => self.leaf("ilike", self.like_pattern()?),
            ViewFilterOperand::DoesNotContain => {
                RecordFilter::not(self.leaf("ilike", self.like_pattern()?))
            }
            ViewFilterOperand::GreaterThan => self.leaf("gt", self.value.clone()),
            ViewFilterOperand::LessThan => self.leaf("lt", self.value.clone()),
            ViewFilterOperand::IsEmpty => self.leaf("is", json!("NULL")),
            ViewFilterOperand::IsNotEmpty => self.leaf("is", json!("NOT_NULL")),
        };
        Ok(filter)
    }

    /// `eq` for a scalar, `in` for a list of options.
    fn equality(&self) -> RecordFilter {
        match &self.value {
            Value::Array(_) => self.leaf("in", self.value.clone()),
            other => self.leaf("eq", other.clone()),
        }
    }

    fn like_pattern(&self) -> Result<Value> {
        match &self.value {
            Value::String(s) => Ok(Value::String(format!("%{s}%"))),
            other => Err(ActionError::invalid_filter(
                &self.field_name,
                format!("contains expects a string, got {other}"),
            )),
        }
    }
}

/// Which records of the current view an action targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum TargetedRecordsRule {
    /// Exactly the checked rows.
    #[serde(rename_all = "camelCase")]
    Selection { selected_record_ids: Vec<String> },
    /// Every row matching the view filters except the unchecked ones.
    #[serde(rename_all = "camelCase")]
    Exclusion { excluded_record_ids: Vec<String> },
}

impl Default for TargetedRecordsRule {
    fn default() -> Self {
        Self::Selection {
            selected_record_ids: Vec::new(),
        }
    }
}

/// Effective filter of a targeted-records rule over the view filters.
///
/// A selection ignores the view filters: the checked ids were already
/// visible under them.
pub fn compute_context_store_filters(
    rule: &TargetedRecordsRule,
    filters: &[ViewFilter],
    object: &ObjectMetadataItem,
) -> Result<RecordFilter> {
    match rule {
        TargetedRecordsRule::Selection {
            selected_record_ids,
        } => Ok(RecordFilter::in_ids(selected_record_ids.iter().cloned())),
        TargetedRecordsRule::Exclusion {
            excluded_record_ids,
        } => {
            let mut filter = RecordFilter::empty();
            for view_filter in filters {
                filter = filter.and_with(view_filter.to_record_filter(object)?);
            }
            if !excluded_record_ids.is_empty() {
                filter = filter.and_with(RecordFilter::not(RecordFilter::in_ids(
                    excluded_record_ids.iter().cloned(),
                )));
            }
            Ok(filter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordhub_core::{FieldMetadata, FieldMetadataType};

    fn person() -> ObjectMetadataItem {
        ObjectMetadataItem::new("person", "people")
            .with_field(FieldMetadata::new("name", FieldMetadataType::FullName))
            .with_field(FieldMetadata::new("city", FieldMetadataType::Text))
            .with_field(FieldMetadata::new("age", FieldMetadataType::Number))
    }

    #[test]
    fn test_operands() {
        let object = person();
        let cases = [
            (
                ViewFilter::new("city", ViewFilterOperand::Is, json!("Paris")),
                json!({"city": {"eq": "Paris"}}),
            ),
            (
                ViewFilter::new("city", ViewFilterOperand::Is, json!(["Paris", "Lyon"])),
                json!({"city": {"in": ["Paris", "Lyon"]}}),
            ),
            (
                ViewFilter::new("city", ViewFilterOperand::IsNot, json!("Paris")),
                json!({"not": {"city": {"eq": "Paris"}}}),
            ),
            (
                ViewFilter::new("city", ViewFilterOperand::Contains, json!("ar")),
                json!({"city": {"ilike": "%ar%"}}),
            ),
            (
                ViewFilter::new("age", ViewFilterOperand::GreaterThan, json!(30)),
                json!({"age": {"gt": 30}}),
            ),
            (
                ViewFilter::new("city", ViewFilterOperand::IsEmpty, Value::Null),
                json!({"city": {"is": "NULL"}}),
            ),
        ];
        for (view_filter, expected) in cases {
            assert_eq!(
                view_filter.to_record_filter(&object).unwrap().to_json(),
                expected,
                "{view_filter:?}"
            );
        }
    }

    #[test]
    fn test_composite_sub_field() {
        let filter = ViewFilter::new("name", ViewFilterOperand::DoesNotContain, json!("jo"))
            .with_sub_field("firstName")
            .to_record_filter(&person())
            .unwrap();
        assert_eq!(
            filter.to_json(),
            json!({"not": {"name": {"firstName": {"ilike": "%jo%"}}}})
        );
    }

    #[test]
    fn test_invalid_filters() {
        let object = person();
        assert!(
            ViewFilter::new("nickname", ViewFilterOperand::Is, json!("x"))
                .to_record_filter(&object)
                .is_err()
        );
        assert!(
            ViewFilter::new("city", ViewFilterOperand::Contains, json!(3))
                .to_record_filter(&object)
                .is_err()
        );
    }

    #[test]
    fn test_soft_delete_filter() {
        assert!(
            ViewFilter::new("deletedAt", ViewFilterOperand::IsNotEmpty, Value::Null)
                .is_soft_delete_filter()
        );
        assert!(!ViewFilter::new("city", ViewFilterOperand::Is, json!("x")).is_soft_delete_filter());
    }

    #[test]
    fn test_selection_rule_ignores_view_filters() {
        let filter = compute_context_store_filters(
            &TargetedRecordsRule::Selection {
                selected_record_ids: vec!["a".into(), "b".into()],
            },
            &[ViewFilter::new("city", ViewFilterOperand::Is, json!("Paris"))],
            &person(),
        )
        .unwrap();
        assert_eq!(filter, RecordFilter::in_ids(["a", "b"]));
    }

    #[test]
    fn test_exclusion_rule() {
        let object = person();
        let view_filters = [ViewFilter::new("city", ViewFilterOperand::Is, json!("Paris"))];

        let all = compute_context_store_filters(
            &TargetedRecordsRule::Exclusion {
                excluded_record_ids: Vec::new(),
            },
            &view_filters,
            &object,
        )
        .unwrap();
        assert_eq!(all, RecordFilter::eq("city", json!("Paris")));

        let except = compute_context_store_filters(
            &TargetedRecordsRule::Exclusion {
                excluded_record_ids: vec!["x".into()],
            },
            &view_filters,
            &object,
        )
        .unwrap();
        assert_eq!(
            except.to_json(),
            json!({"and": [
                {"city": {"eq": "Paris"}},
                {"not": {"id": {"in": ["x"]}}}
            ]})
        );
    }

    #[test]
    fn test_rule_serde() {
        let rule: TargetedRecordsRule = serde_json::from_value(json!({
            "mode": "exclusion",
            "excludedRecordIds": ["x"]
        }))
        .unwrap();
        assert_eq!(
            rule,
            TargetedRecordsRule::Exclusion {
                excluded_record_ids: vec!["x".into()]
            }
        );
    }
}
