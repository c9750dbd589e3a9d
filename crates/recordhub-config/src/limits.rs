//! Row-count bounds applied to queries and batch mutations.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Hard cap on rows returned by one query.
pub const QUERY_MAX_RECORDS: usize = 60;

/// Page size used when paging through all matching records.
pub const DEFAULT_QUERY_PAGE_SIZE: usize = 60;

/// Largest id list accepted by a batch mutation.
pub const BACKEND_BATCH_REQUEST_MAX_COUNT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    #[serde(default = "default_query_max_records")]
    pub query_max_records: usize,
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_batch_max")]
    pub batch_request_max_count: usize,
}

fn default_query_max_records() -> usize {
    QUERY_MAX_RECORDS
}
fn default_page_size() -> usize {
    DEFAULT_QUERY_PAGE_SIZE
}
fn default_batch_max() -> usize {
    BACKEND_BATCH_REQUEST_MAX_COUNT
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            query_max_records: default_query_max_records(),
            default_page_size: default_page_size(),
            batch_request_max_count: default_batch_max(),
        }
    }
}

impl QueryLimits {
    /// Effective row limit: the requested one, capped at the query maximum.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.query_max_records)
            .min(self.query_max_records)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query_max_records == 0 {
            return Err(ConfigError::validation("limits.query_max_records must be > 0"));
        }
        if self.default_page_size == 0 {
            return Err(ConfigError::validation("limits.default_page_size must be > 0"));
        }
        if self.default_page_size > self.query_max_records {
            return Err(ConfigError::validation(
                "limits.default_page_size must be <= limits.query_max_records",
            ));
        }
        if self.batch_request_max_count == 0 {
            return Err(ConfigError::validation(
                "limits.batch_request_max_count must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = QueryLimits::default();
        assert_eq!(limits.query_max_records, 60);
        assert_eq!(limits.default_page_size, 60);
        assert_eq!(limits.batch_request_max_count, 10_000);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_effective_limit() {
        let limits = QueryLimits::default();
        assert_eq!(limits.effective_limit(None), 60);
        assert_eq!(limits.effective_limit(Some(10)), 10);
        assert_eq!(limits.effective_limit(Some(500)), 60);
    }

    #[test]
    fn test_page_size_above_max_rejected() {
        let limits = QueryLimits {
            default_page_size: 100,
            ..Default::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let limits: QueryLimits = toml::from_str("query_max_records = 200").unwrap();
        assert_eq!(limits.query_max_records, 200);
        assert_eq!(limits.default_page_size, DEFAULT_QUERY_PAGE_SIZE);
    }
}
