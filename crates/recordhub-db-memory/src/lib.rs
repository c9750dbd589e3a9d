//! In-memory record storage backend for RecordHub.
//!
//! This crate provides an in-memory implementation of the `RecordStorage`
//! trait from `recordhub-storage`. Compiled predicates are evaluated directly
//! against stored rows, so it behaves like the PostgreSQL backend for filters,
//! full-text search, ordering and soft deletes.
//!
//! # Example
//!
//! ```ignore
//! use recordhub_db_memory::InMemoryStorage;
//! use recordhub_storage::RecordStorage;
//!
//! let storage = InMemoryStorage::with_workspace("workspace_acme", &objects);
//! storage.insert("workspace_acme", "person", row).await?;
//! ```

pub mod query;
pub mod storage;

pub use recordhub_storage::{RecordStorage, StorageError};
pub use storage::{InMemoryStorage, TableKey};

/// Creates a shareable in-memory storage for one workspace.
pub fn create_storage(
    schema: &str,
    objects: &recordhub_core::ObjectMetadataMaps,
) -> recordhub_storage::DynStorage {
    std::sync::Arc::new(InMemoryStorage::with_workspace(schema, objects))
}
