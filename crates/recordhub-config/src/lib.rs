//! Configuration primitives shared by RecordHub crates.
//!
//! - [`limits`]: page-size and batch-size bounds
//! - [`feature_flags`]: per-workspace toggles resolved once per request

pub mod feature_flags;
pub mod limits;

pub use feature_flags::{
    FeatureContext, FeatureFlag, FeatureFlagKey, FeatureFlagMap, FeatureFlagType, FeatureFlags,
};
pub use limits::{
    BACKEND_BATCH_REQUEST_MAX_COUNT, DEFAULT_QUERY_PAGE_SIZE, QUERY_MAX_RECORDS, QueryLimits,
};

/// Error types for configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
