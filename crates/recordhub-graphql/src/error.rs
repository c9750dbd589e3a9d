//! Error types for GraphQL operations.
//!
//! Errors carry a stable code that is exposed to clients in the GraphQL
//! error `extensions.code` entry, and an HTTP status used when a request
//! fails before the schema executes.

use std::fmt;

use async_graphql::ErrorExtensions;
use recordhub_core::CoreError;
use recordhub_query::{FilterError, SqlBuilderError};
use recordhub_storage::StorageError;

/// Errors that can occur during GraphQL operations.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphQLError {
    /// Schema build failed.
    SchemaBuildFailed(String),

    /// Invalid query or malformed argument.
    InvalidQuery(String),

    /// Missing or invalid request context, rejected before any query runs.
    Validation(String),

    /// Filter operator the compiler does not know.
    UnsupportedOperator(String),

    /// Filter or ordering on a field the object does not have.
    UnknownField {
        /// Object name.
        object: String,
        /// Field name.
        field: String,
    },

    /// Filter value the field type cannot hold.
    InvalidFilterValue {
        /// Field name.
        field: String,
        /// What is wrong with the value.
        message: String,
    },

    /// A nested relation could not be expanded.
    RelationExpansion {
        /// Name of the relation field.
        relation: String,
        /// Underlying failure.
        message: String,
    },

    /// The caller may not modify the object.
    PermissionDenied {
        /// Object name.
        object: String,
    },

    /// Object type not present in the workspace metadata.
    ObjectNotFound(String),

    /// Storage error.
    Storage(String),

    /// Internal server error.
    Internal(String),
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaBuildFailed(msg) => {
                write!(f, "Failed to build GraphQL schema: {msg}")
            }
            Self::InvalidQuery(msg) => {
                write!(f, "Invalid GraphQL query: {msg}")
            }
            Self::Validation(msg) => {
                write!(f, "Validation error: {msg}")
            }
            Self::UnsupportedOperator(op) => {
                write!(f, "Unsupported filter operator '{op}'")
            }
            Self::UnknownField { object, field } => {
                write!(f, "Unknown field '{field}' on object '{object}'")
            }
            Self::InvalidFilterValue { field, message } => {
                write!(f, "Invalid filter value for '{field}': {message}")
            }
            Self::RelationExpansion { relation, message } => {
                write!(f, "Failed to expand relation '{relation}': {message}")
            }
            Self::PermissionDenied { object } => {
                write!(f, "Permission denied: no write access to '{object}'")
            }
            Self::ObjectNotFound(name) => {
                write!(f, "Object '{name}' not found")
            }
            Self::Storage(msg) => {
                write!(f, "Storage error: {msg}")
            }
            Self::Internal(msg) => {
                write!(f, "Internal error: {msg}")
            }
        }
    }
}

impl std::error::Error for GraphQLError {}

impl GraphQLError {
    /// Creates a relation expansion error for the named relation.
    pub fn relation(relation: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::RelationExpansion {
            relation: relation.into(),
            message: message.to_string(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SchemaBuildFailed(_) => 500,
            Self::InvalidQuery(_)
            | Self::Validation(_)
            | Self::UnsupportedOperator(_)
            | Self::UnknownField { .. }
            | Self::InvalidFilterValue { .. } => 400,
            Self::PermissionDenied { .. } => 403,
            Self::ObjectNotFound(_) => 404,
            Self::RelationExpansion { .. } | Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for GraphQL error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaBuildFailed(_) => "SCHEMA_BUILD_FAILED",
            Self::InvalidQuery(_) => "INVALID_QUERY",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UnsupportedOperator(_) => "UNSUPPORTED_OPERATOR",
            Self::UnknownField { .. } => "UNKNOWN_FIELD",
            Self::InvalidFilterValue { .. } => "INVALID_FILTER_VALUE",
            Self::RelationExpansion { .. } => "RELATION_EXPANSION_ERROR",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::ObjectNotFound(_) => "NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ErrorExtensions for GraphQLError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.error_code().to_string());
            if let Self::RelationExpansion { relation, .. } = self {
                e.set("relation", relation.clone());
            }
        })
    }
}

impl From<FilterError> for GraphQLError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::UnsupportedOperator { operator } => Self::UnsupportedOperator(operator),
            FilterError::UnknownField { object, field } => Self::UnknownField { object, field },
            FilterError::InvalidValue { field, message } => {
                Self::InvalidFilterValue { field, message }
            }
            FilterError::NotSearchable(_) | FilterError::Builder(_) => {
                Self::Validation(err.to_string())
            }
        }
    }
}

impl From<SqlBuilderError> for GraphQLError {
    fn from(err: SqlBuilderError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StorageError> for GraphQLError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<CoreError> for GraphQLError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ObjectNotFound(name) => Self::ObjectNotFound(name),
            CoreError::FieldNotFound { object, field } => Self::UnknownField { object, field },
            CoreError::InvalidFilter(msg) | CoreError::InvalidId(msg) => Self::Validation(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GraphQLError::Validation("test".into()).status_code(), 400);
        assert_eq!(
            GraphQLError::PermissionDenied {
                object: "person".into()
            }
            .status_code(),
            403
        );
        assert_eq!(GraphQLError::ObjectNotFound("x".into()).status_code(), 404);
        assert_eq!(GraphQLError::relation("company", "boom").status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            GraphQLError::UnsupportedOperator("near".into()).error_code(),
            "UNSUPPORTED_OPERATOR"
        );
        assert_eq!(
            GraphQLError::relation("company", "boom").error_code(),
            "RELATION_EXPANSION_ERROR"
        );
    }

    #[test]
    fn test_filter_error_conversion() {
        let err: GraphQLError = FilterError::UnsupportedOperator {
            operator: "near".into(),
        }
        .into();
        assert_eq!(err, GraphQLError::UnsupportedOperator("near".into()));
    }

    #[test]
    fn test_extensions_carry_code() {
        let err = GraphQLError::PermissionDenied {
            object: "person".into(),
        }
        .extend();
        let extensions = serde_json::to_value(err.extensions.as_ref().unwrap()).unwrap();
        assert_eq!(extensions["code"], "PERMISSION_DENIED");
    }
}
