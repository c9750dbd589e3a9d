//! Opaque keyset cursors.
//!
//! A cursor is URL-safe base64 of a JSON object holding the record id and
//! the values of the ordering columns. Decoding a cursor yields a filter
//! selecting the rows strictly after it under the same ordering.

use base64::Engine;
use recordhub_core::RecordFilter;
use recordhub_query::{NullsOrder, SortOrder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::order::OrderField;

/// Cursor data encoded in the cursor string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorData {
    pub id: Value,
    /// Ordering column → value at the cursor row.
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl CursorData {
    /// Captures the cursor position of a formatted record.
    pub fn from_record(record: &Map<String, Value>, order: &[OrderField]) -> Self {
        let values = order
            .iter()
            .map(|o| (o.column.clone(), o.value_of(record).cloned().unwrap_or(Value::Null)))
            .collect();
        Self {
            id: record.get("id").cloned().unwrap_or(Value::Null),
            values,
        }
    }

    /// Encode cursor data to a base64 string.
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode cursor data from a base64 string.
    pub fn decode(cursor: &str) -> Option<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(cursor)
            .ok()?;
        let json = String::from_utf8(bytes).ok()?;
        serde_json::from_str(&json).ok()
    }

    /// Filter selecting rows strictly after this cursor under `order`.
    ///
    /// Lexicographic: row > cursor on term `i` while equal on all earlier terms.
    pub fn after_filter(&self, order: &[OrderField]) -> RecordFilter {
        let mut branches = Vec::new();
        let mut equal_prefix: Vec<RecordFilter> = Vec::new();

        for term in order {
            let value = self.values.get(&term.column).cloned().unwrap_or(Value::Null);

            if let Some(after) = strictly_after(term, &value) {
                let mut branch = equal_prefix.clone();
                branch.push(after);
                branches.push(RecordFilter::and(branch));
            }

            equal_prefix.push(if value.is_null() {
                leaf(term, "is", json!("NULL"))
            } else {
                leaf(term, "eq", value)
            });
        }

        RecordFilter::or(branches)
    }
}

fn leaf(term: &OrderField, operator: &str, value: Value) -> RecordFilter {
    match &term.sub_field {
        Some(sub) => RecordFilter::composite(term.field.clone(), sub.clone(), operator, value),
        None => RecordFilter::leaf(term.field.clone(), operator, value),
    }
}

fn strictly_after(term: &OrderField, value: &Value) -> Option<RecordFilter> {
    let nulls = term.direction.nulls();
    if value.is_null() {
        // Nothing sorts after NULL when NULLs come last.
        return match nulls {
            NullsOrder::First => Some(leaf(term, "is", json!("NOT_NULL"))),
            NullsOrder::Last => None,
        };
    }

    let operator = match term.direction.sort_order() {
        SortOrder::Asc => "gt",
        SortOrder::Desc => "lt",
    };
    let compare = leaf(term, operator, value.clone());
    Some(match nulls {
        NullsOrder::First => compare,
        NullsOrder::Last => RecordFilter::or(vec![compare, leaf(term, "is", json!("NULL"))]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::order::OrderByDirection;

    fn city(direction: OrderByDirection) -> OrderField {
        OrderField {
            field: "city".into(),
            sub_field: None,
            column: "city".into(),
            direction,
        }
    }

    #[test]
    fn test_cursor_encode_decode() {
        let record = json!({"id": "a1", "city": "Paris"});
        let Value::Object(map) = record else { unreachable!() };
        let order = vec![city(OrderByDirection::AscNullsLast), OrderField::id()];
        let cursor = CursorData::from_record(&map, &order);

        let decoded = CursorData::decode(&cursor.encode()).expect("Should decode");
        assert_eq!(decoded, cursor);
        assert_eq!(decoded.values["city"], "Paris");
    }

    #[test]
    fn test_cursor_decode_invalid() {
        assert!(CursorData::decode("not-valid-base64!!!").is_none());
        assert!(CursorData::decode("").is_none());
    }

    #[test]
    fn test_after_filter_id_only() {
        let cursor = CursorData {
            id: json!("a1"),
            values: Map::from_iter([("id".to_string(), json!("a1"))]),
        };
        let filter = cursor.after_filter(&[OrderField::id()]);
        assert_eq!(
            filter.to_json(),
            json!({"or": [{"and": [{"id": {"gt": "a1"}}]}]})
        );
    }

    #[test]
    fn test_after_null_with_nulls_last_skips_branch() {
        let cursor = CursorData {
            id: json!("a1"),
            values: Map::from_iter([
                ("city".to_string(), Value::Null),
                ("id".to_string(), json!("a1")),
            ]),
        };
        let filter = cursor.after_filter(&[city(OrderByDirection::AscNullsLast), OrderField::id()]);
        assert_eq!(
            filter.to_json(),
            json!({"or": [{"and": [{"city": {"is": "NULL"}}, {"id": {"gt": "a1"}}]}]})
        );
    }
}
