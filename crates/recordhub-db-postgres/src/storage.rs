//! PostgreSQL implementation of [`RecordStorage`].
//!
//! Rows travel as `jsonb`: selects project each row with `to_jsonb` and
//! writes return `to_jsonb(r.*)`, which keeps the backend independent of
//! the column set of a workspace table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use recordhub_query::{BuiltQuery, SelectQuery, SqlValue, escape_identifier};
use recordhub_storage::{RawRow, RecordStorage, StorageError, prepare_insert};
use serde_json::Value;
use sqlx_core::query_scalar::{QueryScalar, query_scalar};
use sqlx_core::types::Json;
use sqlx_postgres::{PgArguments, PgPool, Postgres};
use tracing::{debug, instrument, warn};

use crate::config::PostgresConfig;
use crate::error::{PostgresError, storage_error};
use crate::pool::create_pool;

/// Record storage backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connects a new pool from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created.
    pub async fn new(config: &PostgresConfig) -> Result<Self, PostgresError> {
        let pool = create_pool(config).await?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Columns rendered by `to_jsonb` in Postgres timestamp form.
const TIMESTAMP_COLUMNS: [&str; 3] = ["createdAt", "updatedAt", "deletedAt"];

fn json_row(value: Value) -> Result<RawRow, StorageError> {
    match value {
        Value::Object(mut map) => {
            for column in TIMESTAMP_COLUMNS {
                if let Some(Value::String(raw)) = map.get(column)
                    && let Some(normalized) = normalize_timestamp(raw)
                {
                    map.insert(column.to_string(), Value::String(normalized));
                }
            }
            Ok(map)
        }
        other => Err(StorageError::internal(format!(
            "expected a JSON object row, got {other}"
        ))),
    }
}

/// Builds the insert statement for an explicit column list.
///
/// Only the supplied columns are written, so generated columns such as
/// `searchVector` are left to the database.
fn build_insert(schema: &str, table: &str, columns: &[&str]) -> Result<String, StorageError> {
    let target = format!("{}.{}", escape_identifier(schema)?, escape_identifier(table)?);
    let columns = columns
        .iter()
        .map(|c| escape_identifier(c))
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");
    Ok(format!(
        "INSERT INTO {target} AS r ({columns}) \
         SELECT {columns} FROM jsonb_populate_record(NULL::{target}, $1) \
         RETURNING to_jsonb(r.*)"
    ))
}

fn build_soft_delete(schema: &str, table: &str) -> Result<String, StorageError> {
    let target = format!("{}.{}", escape_identifier(schema)?, escape_identifier(table)?);
    Ok(format!(
        "UPDATE {target} AS r SET \"deletedAt\" = now() \
         WHERE r.\"id\" = ANY($1::uuid[]) AND r.\"deletedAt\" IS NULL \
         RETURNING to_jsonb(r.*)"
    ))
}

/// Helper trait to bind all params to a query.
trait BindAllParams<'q> {
    fn bind_all_params(self, params: &'q [SqlValue]) -> Self;
}

impl<'q, O> BindAllParams<'q> for QueryScalar<'q, Postgres, O, PgArguments> {
    fn bind_all_params(mut self, params: &'q [SqlValue]) -> Self {
        for param in params {
            self = match param {
                SqlValue::Text(s) => self.bind(s.as_str()),
                SqlValue::Integer(i) => self.bind(*i),
                SqlValue::Float(f) => self.bind(*f),
                SqlValue::Boolean(b) => self.bind(*b),
                SqlValue::Uuid(u) => self.bind(*u),
                SqlValue::Timestamp(ts) => self.bind(*ts),
                SqlValue::Json(v) => self.bind(Json(v)),
                SqlValue::TextArray(values) => self.bind(values.as_slice()),
                SqlValue::Null => self.bind(None::<String>),
            };
        }
        self
    }
}

impl PostgresStorage {
    async fn fetch_rows(
        &self,
        sql: &str,
        params: &[SqlValue],
        schema: &str,
        table: &str,
    ) -> Result<Vec<RawRow>, StorageError> {
        let rows: Vec<Json<Value>> = query_scalar::<Postgres, Json<Value>>(sql)
            .bind_all_params(params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, sql = %sql, "Record query failed");
                storage_error(e, schema, table)
            })?;

        rows.into_iter().map(|Json(value)| json_row(value)).collect()
    }
}

#[async_trait]
impl RecordStorage for PostgresStorage {
    #[instrument(skip(self, query), fields(table = %query.table()))]
    async fn find_many(&self, query: &SelectQuery) -> Result<Vec<RawRow>, StorageError> {
        let BuiltQuery { sql, params } = query.build_jsonb()?;
        debug!(sql = %sql, params = params.len(), "Executing find_many");
        self.fetch_rows(&sql, &params, query.schema(), query.table())
            .await
    }

    #[instrument(skip(self, query), fields(table = %query.table()))]
    async fn count(&self, query: &SelectQuery) -> Result<u64, StorageError> {
        let BuiltQuery { sql, params } = query.build_count()?;
        let total: i64 = query_scalar::<Postgres, i64>(&sql)
            .bind_all_params(&params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, sql = %sql, "Count query failed");
                storage_error(e, query.schema(), query.table())
            })?;
        Ok(u64::try_from(total).unwrap_or(0))
    }

    #[instrument(skip(self, row))]
    async fn insert(
        &self,
        schema: &str,
        table: &str,
        row: RawRow,
    ) -> Result<RawRow, StorageError> {
        let row = prepare_insert(row);
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StorageError::invalid_record("id must be a string"))?;

        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        let sql = build_insert(schema, table, &columns)?;
        let params = [SqlValue::Json(Value::Object(row.clone()))];

        let mut inserted = self
            .fetch_rows(&sql, &params, schema, table)
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists { table, .. } => StorageError::already_exists(table, id),
                other => other,
            })?;

        inserted
            .pop()
            .ok_or_else(|| StorageError::internal("insert returned no row"))
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn soft_delete_many(
        &self,
        schema: &str,
        table: &str,
        ids: &[String],
    ) -> Result<Vec<RawRow>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = build_soft_delete(schema, table)?;
        let params = [SqlValue::TextArray(ids.to_vec())];
        let deleted = self.fetch_rows(&sql, &params, schema, table).await?;
        debug!(deleted = deleted.len(), "Soft deleted records");
        Ok(deleted)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// Renders a timestamp as RFC 3339 with milliseconds, matching rows written
/// by the in-memory backend.
fn normalize_timestamp(value: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_insert_uses_explicit_columns() {
        let sql = build_insert("ws", "person", &["id", "city"]).unwrap();
        assert!(sql.starts_with("INSERT INTO \"ws\".\"person\" AS r (\"id\", \"city\")"));
        assert!(sql.contains("jsonb_populate_record(NULL::\"ws\".\"person\", $1)"));
        assert!(sql.ends_with("RETURNING to_jsonb(r.*)"));
    }

    #[test]
    fn test_build_insert_rejects_bad_column() {
        let result = build_insert("ws", "person", &["id; DROP TABLE x"]);
        assert!(matches!(result, Err(StorageError::Query { .. })));
    }

    #[test]
    fn test_build_soft_delete_skips_deleted_rows() {
        let sql = build_soft_delete("ws", "person").unwrap();
        assert!(sql.contains("ANY($1::uuid[])"));
        assert!(sql.contains("r.\"deletedAt\" IS NULL"));
    }

    #[test]
    fn test_json_row_requires_object() {
        assert!(json_row(serde_json::json!({"id": "1"})).is_ok());
        assert!(json_row(serde_json::json!([1])).is_err());

        let row = json_row(serde_json::json!({
            "createdAt": "2024-01-02T03:04:05.5+00:00",
            "deletedAt": null
        }))
        .unwrap();
        assert_eq!(row["createdAt"], "2024-01-02T03:04:05.500Z");
        assert!(row["deletedAt"].is_null());
    }

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(
            normalize_timestamp("2024-01-02T03:04:05.123456+00:00").as_deref(),
            Some("2024-01-02T03:04:05.123Z")
        );
        assert_eq!(normalize_timestamp("nope"), None);
    }
}
