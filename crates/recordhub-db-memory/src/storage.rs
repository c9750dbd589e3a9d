use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use recordhub_core::{ObjectMetadataItem, ObjectMetadataMaps, SEARCH_VECTOR_FIELD, metadata};
use recordhub_query::{QueryMode, SelectQuery, to_tsvector};
use recordhub_storage::{
    RawRow, RecordStorage, StorageError, now_timestamp, prepare_insert,
};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::query::{compare_rows, matches};

/// Key of one table: `(schema, table)`.
pub type TableKey = (String, String);

/// Rows of one table in insertion order, plus the columns feeding its search vector.
#[derive(Debug, Default, Clone)]
struct Table {
    rows: IndexMap<String, RawRow>,
    search_columns: Vec<String>,
}

impl Table {
    fn refresh_search_vector(&self, row: &mut RawRow) {
        if self.search_columns.is_empty() {
            return;
        }
        let text = self
            .search_columns
            .iter()
            .filter_map(|c| row.get(c).and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        let lexemes = to_tsvector(&text).into_iter().map(Value::String).collect();
        row.insert(SEARCH_VECTOR_FIELD.to_string(), Value::Array(lexemes));
    }
}

/// In-memory record storage backend.
///
/// Tables must be registered from object metadata before use. The generated
/// `searchVector` column is maintained on insert, mirroring a generated
/// column in PostgreSQL. Query results keep insertion order for rows that
/// compare equal under the requested ordering.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStorage {
    tables: Arc<RwLock<HashMap<TableKey, Table>>>,
}

/// Columns holding the text of the object's search vector fields.
fn search_columns(object: &ObjectMetadataItem) -> Vec<String> {
    object
        .search_vector_fields
        .iter()
        .filter_map(|name| object.field(name))
        .flat_map(|field| match field.field_type.composite_properties() {
            Some(properties) => properties
                .iter()
                .filter(|p| p.kind == recordhub_core::CompositePropertyKind::Text)
                .map(|p| metadata::composite_column_name(&field.name, p.name))
                .collect(),
            None => vec![field.name.clone()],
        })
        .collect()
}

impl InMemoryStorage {
    /// Creates an empty storage without tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage with one table per object of the workspace.
    pub fn with_workspace(schema: &str, objects: &ObjectMetadataMaps) -> Self {
        let mut tables = HashMap::new();
        for object in objects.iter() {
            tables.insert(
                (schema.to_string(), object.name_singular.clone()),
                Table {
                    rows: IndexMap::new(),
                    search_columns: search_columns(object),
                },
            );
        }
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    /// Registers (or re-registers) the table of one object. Existing rows are kept.
    pub async fn register_object(&self, schema: &str, object: &ObjectMetadataItem) {
        let mut tables = self.tables.write().await;
        let table = tables
            .entry((schema.to_string(), object.name_singular.clone()))
            .or_default();
        table.search_columns = search_columns(object);
    }

    /// Number of stored rows in a table, soft-deleted rows included.
    pub async fn row_count(&self, schema: &str, table: &str) -> usize {
        let tables = self.tables.read().await;
        tables
            .get(&(schema.to_string(), table.to_string()))
            .map_or(0, |t| t.rows.len())
    }

    fn key(schema: &str, table: &str) -> TableKey {
        (schema.to_string(), table.to_string())
    }
}

#[async_trait]
impl RecordStorage for InMemoryStorage {
    async fn find_many(&self, query: &SelectQuery) -> Result<Vec<RawRow>, StorageError> {
        let tables = self.tables.read().await;
        let table = tables
            .get(&Self::key(query.schema(), query.table()))
            .ok_or_else(|| StorageError::table_not_found(query.schema(), query.table()))?;

        let predicate = query.predicate();
        let mut rows: Vec<&RawRow> = table
            .rows
            .values()
            .filter(|row| matches(&predicate, row))
            .collect();

        // Stable: ties keep insertion order.
        if !query.order().is_empty() {
            rows.sort_by(|a, b| compare_rows(query.order(), a, b));
        }

        let limit = query.limit().unwrap_or(usize::MAX);
        let result: Vec<RawRow> = rows
            .into_iter()
            .take(limit)
            .map(|row| match query.mode() {
                QueryMode::Rows => row.clone(),
                QueryMode::IdsOnly => {
                    let mut ids = RawRow::new();
                    if let Some(id) = row.get("id") {
                        ids.insert("id".to_string(), id.clone());
                    }
                    ids
                }
            })
            .collect();

        debug!(table = %query.table(), count = result.len(), "In-memory find_many");
        Ok(result)
    }

    async fn count(&self, query: &SelectQuery) -> Result<u64, StorageError> {
        let tables = self.tables.read().await;
        let table = tables
            .get(&Self::key(query.schema(), query.table()))
            .ok_or_else(|| StorageError::table_not_found(query.schema(), query.table()))?;

        let predicate = query.predicate();
        Ok(table.rows.values().filter(|row| matches(&predicate, row)).count() as u64)
    }

    async fn insert(
        &self,
        schema: &str,
        table: &str,
        row: RawRow,
    ) -> Result<RawRow, StorageError> {
        let mut tables = self.tables.write().await;
        let target = tables
            .get_mut(&Self::key(schema, table))
            .ok_or_else(|| StorageError::table_not_found(schema, table))?;

        let mut row = prepare_insert(row);
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StorageError::invalid_record("id must be a string"))?;

        if target.rows.contains_key(&id) {
            return Err(StorageError::already_exists(table, id));
        }

        target.refresh_search_vector(&mut row);
        target.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn soft_delete_many(
        &self,
        schema: &str,
        table: &str,
        ids: &[String],
    ) -> Result<Vec<RawRow>, StorageError> {
        let mut tables = self.tables.write().await;
        let target = tables
            .get_mut(&Self::key(schema, table))
            .ok_or_else(|| StorageError::table_not_found(schema, table))?;

        let now = Value::String(now_timestamp());
        let mut deleted = Vec::new();
        for id in ids {
            if let Some(row) = target.rows.get_mut(id)
                && row.get("deletedAt").is_none_or(Value::is_null)
            {
                row.insert("deletedAt".to_string(), now.clone());
                deleted.push(row.clone());
            }
        }

        debug!(table = %table, requested = ids.len(), deleted = deleted.len(), "In-memory soft delete");
        Ok(deleted)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordhub_core::{FieldMetadata, FieldMetadataType};
    use recordhub_query::{OrderByExpr, Predicate, SearchTerms, SqlValue, Operator};
    use serde_json::json;

    fn workspace() -> ObjectMetadataMaps {
        ObjectMetadataMaps::from_items(vec![
            ObjectMetadataItem::new("person", "people")
                .with_field(FieldMetadata::new("name", FieldMetadataType::FullName))
                .with_field(FieldMetadata::new("city", FieldMetadataType::Text))
                .with_search_vector(&["name", "city"]),
        ])
        .unwrap()
    }

    fn row(value: Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            _ => RawRow::new(),
        }
    }

    async fn seeded() -> InMemoryStorage {
        let storage = InMemoryStorage::with_workspace("ws", &workspace());
        for (first, last, city) in [
            ("John", "Doe", "Paris"),
            ("Jane", "Doe", "Lyon"),
            ("Bob", "Smith", "Paris"),
        ] {
            storage
                .insert(
                    "ws",
                    "person",
                    row(json!({"nameFirstName": first, "nameLastName": last, "city": city})),
                )
                .await
                .unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn test_insert_computes_search_vector() {
        let storage = seeded().await;
        let rows = storage
            .find_many(&SelectQuery::new("ws", "person").take(1))
            .await
            .unwrap();
        assert_eq!(rows[0]["searchVector"], json!(["john", "doe", "paris"]));
        assert!(rows[0]["id"].is_string());
    }

    #[tokio::test]
    async fn test_find_many_filters_and_orders() {
        let storage = seeded().await;
        let query = SelectQuery::new("ws", "person")
            .where_condition(Predicate::compare(
                "city",
                Operator::Eq,
                SqlValue::Text("Paris".into()),
            ))
            .order_by(OrderByExpr::desc("nameFirstName"));
        let rows = storage.find_many(&query).await.unwrap();
        let names: Vec<&str> = rows
            .iter()
            .map(|r| r["nameFirstName"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["John", "Bob"]);
        assert_eq!(storage.count(&query).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_search_ranking_is_stable() {
        let storage = seeded().await;
        let terms = SearchTerms::from_input("doe").unwrap();
        let mut query = SelectQuery::new("ws", "person");
        query.and_where(terms.predicate());
        for order in terms.ranking() {
            query.push_order_by(order);
        }
        let rows = storage.find_many(&query).await.unwrap();
        let names: Vec<&str> = rows
            .iter()
            .map(|r| r["nameFirstName"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["John", "Jane"]);
    }

    #[tokio::test]
    async fn test_soft_delete_many() {
        let storage = seeded().await;
        let ids: Vec<String> = storage
            .find_many(&SelectQuery::new("ws", "person").ids_only())
            .await
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids.len(), 3);

        let deleted = storage
            .soft_delete_many("ws", "person", &ids[..2])
            .await
            .unwrap();
        assert_eq!(deleted.len(), 2);
        assert!(deleted[0]["deletedAt"].is_string());

        // Already deleted rows are skipped.
        let again = storage
            .soft_delete_many("ws", "person", &ids[..1])
            .await
            .unwrap();
        assert!(again.is_empty());

        let live = SelectQuery::new("ws", "person").where_condition(Predicate::is_null("deletedAt"));
        assert_eq!(storage.count(&live).await.unwrap(), 1);
        assert_eq!(storage.row_count("ws", "person").await, 3);
    }

    #[tokio::test]
    async fn test_duplicate_and_unknown_table() {
        let storage = seeded().await;
        storage
            .insert("ws", "person", row(json!({"id": "fixed"})))
            .await
            .unwrap();
        let dup = storage
            .insert("ws", "person", row(json!({"id": "fixed"})))
            .await;
        assert!(matches!(dup, Err(StorageError::AlreadyExists { .. })));

        let missing = storage.find_many(&SelectQuery::new("ws", "company")).await;
        assert!(matches!(missing, Err(StorageError::TableNotFound { .. })));
    }

    #[tokio::test]
    async fn test_register_object_adds_table() {
        let storage = InMemoryStorage::new();
        storage
            .register_object("ws", &ObjectMetadataItem::new("note", "notes"))
            .await;
        storage
            .insert("ws", "note", row(json!({})))
            .await
            .unwrap();
        assert_eq!(storage.row_count("ws", "note").await, 1);
        assert_eq!(storage.backend_name(), "memory");
    }
}
