//! # recordhub-storage
//!
//! Storage abstraction layer for RecordHub.
//!
//! This crate defines the [`RecordStorage`] trait that every backend
//! implements. Implementations live in separate crates
//! (`recordhub-db-memory`, `recordhub-db-postgres`).

mod error;
mod traits;
mod types;

pub use error::{ErrorCategory, StorageError};
pub use traits::RecordStorage;
pub use types::{RawRow, now_timestamp, prepare_insert};

/// Type alias for a storage result.
pub type StorageResult<T> = Result<T, StorageError>;

/// Type alias for a shared storage trait object.
pub type DynStorage = std::sync::Arc<dyn RecordStorage>;
