use recordhub_graphql::GraphQLError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid view filter on '{field}': {message}")]
    InvalidViewFilter { field: String, message: String },

    /// The records API call failed; the error is passed through unchanged.
    #[error(transparent)]
    Api(#[from] GraphQLError),
}

impl ActionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_filter(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidViewFilter {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_is_transparent() {
        let err = ActionError::from(GraphQLError::PermissionDenied {
            object: "person".into(),
        });
        assert_eq!(
            err.to_string(),
            GraphQLError::PermissionDenied {
                object: "person".into()
            }
            .to_string()
        );
    }

    #[test]
    fn test_validation_display() {
        assert_eq!(
            ActionError::validation("Current view ID is not defined").to_string(),
            "Validation error: Current view ID is not defined"
        );
    }
}
