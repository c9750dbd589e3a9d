//! Storage error types for the record storage abstraction layer.

use std::fmt;

use recordhub_query::SqlBuilderError;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested table does not exist.
    #[error("Table not found: {schema}.{table}")]
    TableNotFound { schema: String, table: String },

    /// Attempted to insert a record whose id is already taken.
    #[error("Record already exists: {table}/{id}")]
    AlreadyExists { table: String, id: String },

    /// The record data is invalid.
    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },

    /// The query could not be built or executed.
    #[error("Query error: {message}")]
    Query { message: String },

    /// Failed to connect to the storage backend.
    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StorageError {
    #[must_use]
    pub fn table_not_found(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self::TableNotFound {
            schema: schema.into(),
            table: table.into(),
        }
    }

    #[must_use]
    pub fn already_exists(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            table: table.into(),
            id: id.into(),
        }
    }

    #[must_use]
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TableNotFound { .. } => ErrorCategory::NotFound,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::InvalidRecord { .. } | Self::Query { .. } => ErrorCategory::Validation,
            Self::ConnectionError { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<SqlBuilderError> for StorageError {
    fn from(err: SqlBuilderError) -> Self {
        Self::query(err.to_string())
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Validation,
    Infrastructure,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
