//! Raw row → GraphQL record shape.
//!
//! Composite fields stored as flat `{field}{SubField}` columns are folded
//! back into nested objects, and the search vector column is dropped.
//! Columns without field metadata (join columns such as `companyId`) pass
//! through unchanged.

use recordhub_core::{FieldMetadataType, ObjectMetadataItem, ObjectRecord};
use recordhub_storage::RawRow;
use serde_json::{Map, Value};

/// Formats one row of `object`'s table.
pub fn format_record(mut row: RawRow, object: &ObjectMetadataItem) -> ObjectRecord {
    for field in &object.fields {
        if field.field_type == FieldMetadataType::TsVector {
            row.remove(&field.name);
            continue;
        }

        let Some(properties) = field.field_type.composite_properties() else {
            continue;
        };

        let mut composite = Map::new();
        let mut present = false;
        for property in properties {
            let column = recordhub_core::metadata::composite_column_name(&field.name, property.name);
            let value = row.remove(&column);
            present |= value.is_some();
            composite.insert(property.name.to_string(), value.unwrap_or(Value::Null));
        }
        if present {
            row.insert(field.name.clone(), Value::Object(composite));
        }
    }

    ObjectRecord::new(object.name_singular.clone(), row)
}

pub fn format_records(rows: Vec<RawRow>, object: &ObjectMetadataItem) -> Vec<ObjectRecord> {
    rows.into_iter().map(|row| format_record(row, object)).collect()
}
