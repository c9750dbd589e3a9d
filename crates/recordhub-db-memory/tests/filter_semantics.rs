//! Compiled filters evaluated in memory select exactly the rows the filter
//! tree describes.

use recordhub_core::{FieldMetadata, FieldMetadataType, ObjectMetadataItem, RecordFilter};
use recordhub_db_memory::query::matches;
use recordhub_query::compile_filter;
use recordhub_storage::RawRow;
use serde_json::{Value, json};

fn person() -> ObjectMetadataItem {
    ObjectMetadataItem::new("person", "people")
        .with_field(FieldMetadata::new("city", FieldMetadataType::Text))
        .with_field(FieldMetadata::new("age", FieldMetadataType::Number))
        .with_field(FieldMetadata::new("status", FieldMetadataType::Select))
}

fn rows() -> Vec<RawRow> {
    [
        json!({"id": "p1", "city": "Paris", "age": 25, "status": "open"}),
        json!({"id": "p2", "city": "Lyon", "age": 41, "status": null}),
        json!({"id": "p3", "city": "Paris", "age": 52, "status": "won"}),
        json!({"id": "p4", "city": "Nice", "age": 33, "status": "open"}),
        json!({"id": "p5", "city": "Lyon", "age": 19, "status": "lost"}),
        json!({"id": "p6", "city": "Berlin", "age": 60, "status": null}),
    ]
    .into_iter()
    .filter_map(|v| match v {
        Value::Object(map) => Some(map),
        _ => None,
    })
    .collect()
}

/// Direct evaluation of the tree over rows whose filtered columns are never
/// compared against NULL, so two-valued logic is exact.
fn expected(filter: &RecordFilter, row: &RawRow) -> bool {
    match filter {
        RecordFilter::Leaf(leaf) => {
            let cell = row.get(&leaf.field).unwrap_or(&Value::Null);
            match leaf.operator.as_str() {
                "eq" => cell == &leaf.value,
                "gt" => cell.as_f64().zip(leaf.value.as_f64()).is_some_and(|(a, b)| a > b),
                "in" => leaf.value.as_array().is_some_and(|values| values.contains(cell)),
                "is" => cell.is_null() == (leaf.value == json!("NULL")),
                other => panic!("operator {other} not covered"),
            }
        }
        RecordFilter::And(children) => children.iter().all(|c| expected(c, row)),
        // `or: []` places no restriction.
        RecordFilter::Or(children) => {
            children.is_empty() || children.iter().any(|c| expected(c, row))
        }
        RecordFilter::Not(child) => !expected(child, row),
    }
}

fn ids(rows: &[RawRow], keep: impl Fn(&RawRow) -> bool) -> Vec<String> {
    rows.iter()
        .filter(|r| keep(r))
        .filter_map(|r| r.get("id").and_then(Value::as_str).map(str::to_string))
        .collect()
}

#[test]
fn test_composite_trees_match_tree_semantics() {
    let object = person();
    let rows = rows();
    let cases = [
        (json!({"or": [{}, {"city": {"eq": "Paris"}}]}), 6),
        (json!({"not": {}}), 0),
        (json!({"and": [{}, {"city": {"eq": "Paris"}}]}), 2),
        (json!({"or": [{"not": {}}, {"city": {"eq": "Lyon"}}]}), 2),
        (json!({"and": [{"or": []}, {"age": {"gt": 50}}]}), 2),
        (json!({"or": [{"city": {"eq": "Paris"}}, {"age": {"gt": 40}}]}), 4),
        (
            json!({"not": {"or": [{"city": {"eq": "Paris"}}, {"status": {"is": "NULL"}}]}}),
            2,
        ),
        (
            json!({"and": [
                {"or": [{"city": {"in": ["Lyon", "Nice"]}}, {"age": {"gt": 50}}]},
                {"not": {"status": {"is": "NULL"}}}
            ]}),
            3,
        ),
        (
            json!({"not": {"not": {"and": [
                {"age": {"gt": 20}},
                {"or": [{}, {"city": {"eq": "Rome"}}]}
            ]}}}),
            5,
        ),
        (json!({"city": {"eq": "Paris"}, "age": {"gt": 30}}), 1),
    ];

    for (value, count) in cases {
        let filter = RecordFilter::from_json(&value).unwrap();
        let predicate = compile_filter(&filter, &object).unwrap();

        let actual = ids(&rows, |r| matches(&predicate, r));
        let wanted = ids(&rows, |r| expected(&filter, r));
        assert_eq!(actual, wanted, "filter {value}");
        assert_eq!(actual.len(), count, "filter {value}");
    }
}
