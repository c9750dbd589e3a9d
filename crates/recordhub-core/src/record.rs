use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single workspace record with dynamically typed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub object_name_singular: String,
    pub fields: Map<String, Value>,
}

impl ObjectRecord {
    pub fn new(object_name_singular: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            object_name_singular: object_name_singular.into(),
            fields,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_accessors() {
        let fields = json!({"id": "a1", "city": "Paris"});
        let Value::Object(map) = fields else {
            unreachable!()
        };
        let mut record = ObjectRecord::new("person", map);
        assert_eq!(record.id(), Some("a1"));
        record.set("city", json!("Lyon"));
        assert_eq!(record.get("city"), Some(&json!("Lyon")));
        assert_eq!(record.into_value()["city"], "Lyon");
    }
}
