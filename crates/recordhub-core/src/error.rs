use thiserror::Error;

/// Core error types for RecordHub operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown object: {0}")]
    ObjectNotFound(String),

    #[error("Unknown field '{field}' on object '{object}'")]
    FieldNotFound { object: String, field: String },

    #[error("Invalid record id: {0}")]
    InvalidId(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new ObjectNotFound error
    pub fn object_not_found(name: impl Into<String>) -> Self {
        Self::ObjectNotFound(name.into())
    }

    /// Create a new FieldNotFound error
    pub fn field_not_found(object: impl Into<String>, field: impl Into<String>) -> Self {
        Self::FieldNotFound {
            object: object.into(),
            field: field.into(),
        }
    }

    /// Create a new InvalidFilter error
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilter(message.into())
    }

    /// Create a new InvalidMetadata error
    pub fn invalid_metadata(message: impl Into<String>) -> Self {
        Self::InvalidMetadata(message.into())
    }

    /// Check if this error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ObjectNotFound(_)
                | Self::FieldNotFound { .. }
                | Self::InvalidId(_)
                | Self::InvalidFilter(_)
                | Self::JsonError(_)
        )
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::field_not_found("person", "nickname");
        assert_eq!(err.to_string(), "Unknown field 'nickname' on object 'person'");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(CoreError::object_not_found("person").is_client_error());
        assert!(CoreError::invalid_filter("bad").is_client_error());
        assert!(!CoreError::invalid_metadata("duplicate field").is_client_error());
    }
}
