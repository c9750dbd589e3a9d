//! Storage trait for workspace record tables.

use async_trait::async_trait;
use recordhub_query::SelectQuery;

use crate::error::StorageError;
use crate::types::RawRow;

/// The storage trait that all record backends implement.
///
/// Queries arrive fully built: filters, search predicates, ordering and limits
/// are already attached to the [`SelectQuery`]. Implementations must be
/// thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use recordhub_query::{OrderByExpr, SelectQuery};
/// use recordhub_storage::{RecordStorage, StorageError, RawRow};
///
/// async fn first_people(storage: &dyn RecordStorage) -> Result<Vec<RawRow>, StorageError> {
///     let query = SelectQuery::new("workspace_acme", "person")
///         .order_by(OrderByExpr::asc("id"))
///         .take(10);
///     storage.find_many(&query).await
/// }
/// ```
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Executes a select and returns the matching rows in query order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TableNotFound` for unknown tables.
    async fn find_many(&self, query: &SelectQuery) -> Result<Vec<RawRow>, StorageError>;

    /// Counts rows matching the query's conditions. Ordering and limit are ignored.
    async fn count(&self, query: &SelectQuery) -> Result<u64, StorageError>;

    /// Inserts one row. System columns are filled in when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the id is taken.
    async fn insert(&self, schema: &str, table: &str, row: RawRow)
    -> Result<RawRow, StorageError>;

    /// Sets `deletedAt` on the given, not yet deleted rows and returns them.
    async fn soft_delete_many(
        &self,
        schema: &str,
        table: &str,
        ids: &[String],
    ) -> Result<Vec<RawRow>, StorageError>;

    /// Returns the name of this storage backend.
    fn backend_name(&self) -> &'static str;
}
