//! PostgreSQL errors and their mapping onto [`StorageError`].

use recordhub_storage::StorageError;
use sqlx_core::error::Error as SqlxError;

/// SQLSTATE codes the record backend tells apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlState {
    /// `42P01`: the object has no table in this workspace schema.
    UndefinedTable,
    /// `42703`: metadata names a column the table lacks.
    UndefinedColumn,
    /// `23505`
    UniqueViolation,
    /// `22P02`: e.g. a malformed uuid in `recordIdsToDelete`.
    InvalidTextRepresentation,
    /// `57014`: cancelled by `statement_timeout`.
    QueryCanceled,
}

impl SqlState {
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "42P01" => Self::UndefinedTable,
            "42703" => Self::UndefinedColumn,
            "23505" => Self::UniqueViolation,
            "22P02" => Self::InvalidTextRepresentation,
            "57014" => Self::QueryCanceled,
            _ => return None,
        })
    }

    /// The recognized SQLSTATE of a database error, if any.
    pub fn of(err: &SqlxError) -> Option<Self> {
        match err {
            SqlxError::Database(db_err) => db_err.code().as_deref().and_then(Self::from_code),
            _ => None,
        }
    }
}

/// Errors raised while setting up the backend.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    #[error("Database connection error: {0}")]
    Connection(#[from] SqlxError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl PostgresError {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<PostgresError> for StorageError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Connection(e) => StorageError::connection_error(e.to_string()),
            PostgresError::Config { message } => {
                StorageError::internal(format!("Configuration error: {message}"))
            }
        }
    }
}

/// Maps a failed statement against `schema.table`.
pub fn storage_error(err: SqlxError, schema: &str, table: &str) -> StorageError {
    match SqlState::of(&err) {
        Some(SqlState::UndefinedTable) => return StorageError::table_not_found(schema, table),
        Some(SqlState::UniqueViolation) => return StorageError::already_exists(table, ""),
        Some(SqlState::InvalidTextRepresentation) => {
            return StorageError::invalid_record(err.to_string());
        }
        Some(SqlState::QueryCanceled) => {
            return StorageError::query(format!("statement timed out on {schema}.{table}"));
        }
        Some(SqlState::UndefinedColumn) | None => {}
    }
    match err {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) | SqlxError::Tls(_) => {
            StorageError::connection_error(err.to_string())
        }
        other => StorageError::query(other.to_string()),
    }
}

/// Result type alias for PostgreSQL operations.
pub type Result<T> = std::result::Result<T, PostgresError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_state_codes() {
        assert_eq!(SqlState::from_code("42P01"), Some(SqlState::UndefinedTable));
        assert_eq!(SqlState::from_code("22P02"), Some(SqlState::InvalidTextRepresentation));
        assert_eq!(SqlState::from_code("57014"), Some(SqlState::QueryCanceled));
        assert_eq!(SqlState::from_code("XX000"), None);
        assert_eq!(SqlState::of(&SqlxError::RowNotFound), None);
    }

    #[test]
    fn test_pool_failures_are_connection_errors() {
        let err = storage_error(SqlxError::PoolTimedOut, "workspace_acme", "person");
        assert!(matches!(err, StorageError::ConnectionError { .. }));

        let err = storage_error(SqlxError::RowNotFound, "workspace_acme", "person");
        assert!(matches!(err, StorageError::Query { .. }));
    }

    #[test]
    fn test_setup_errors_convert() {
        let err: StorageError = PostgresError::config("bad url").into();
        assert!(matches!(err, StorageError::Internal { .. }));
        assert!(PostgresError::config("bad url").to_string().contains("Configuration error"));
    }
}
