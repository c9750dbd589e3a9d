use chrono::{SecondsFormat, Utc};
use recordhub_core::generate_id;
use serde_json::{Map, Value};

/// A row as stored: flat column name to value.
pub type RawRow = Map<String, Value>;

/// Current time in the format stored in timestamp columns.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fill the system columns a new row needs: `id`, `createdAt`, `updatedAt`, `deletedAt`.
pub fn prepare_insert(mut row: RawRow) -> RawRow {
    let now = now_timestamp();
    if !row.get("id").is_some_and(Value::is_string) {
        row.insert("id".to_string(), Value::String(generate_id()));
    }
    row.entry("createdAt")
        .or_insert_with(|| Value::String(now.clone()));
    row.entry("updatedAt").or_insert_with(|| Value::String(now));
    row.entry("deletedAt").or_insert(Value::Null);
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prepare_insert_fills_system_columns() {
        let Value::Object(row) = json!({"city": "Paris"}) else {
            unreachable!()
        };
        let row = prepare_insert(row);
        assert!(row["id"].is_string());
        assert!(row["createdAt"].is_string());
        assert_eq!(row["deletedAt"], Value::Null);
    }

    #[test]
    fn test_prepare_insert_keeps_given_id() {
        let Value::Object(row) = json!({"id": "abc", "createdAt": "2024-01-01T00:00:00Z"}) else {
            unreachable!()
        };
        let row = prepare_insert(row);
        assert_eq!(row["id"], "abc");
        assert_eq!(row["createdAt"], "2024-01-01T00:00:00Z");
    }
}
