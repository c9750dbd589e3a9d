//! # recordhub-graphql
//!
//! GraphQL record API for RecordHub workspaces.
//!
//! The schema is generated at startup from the workspace object metadata
//! with async-graphql's dynamic schema API. Every object gets a paginated
//! list query, a full-text search query and a batch soft-delete mutation.
//!
//! ## Request flow
//!
//! 1. The `filter` argument is parsed into a [`recordhub_core::RecordFilter`]
//!    and compiled onto a [`recordhub_query::SelectQuery`].
//! 2. Search terms, when given, restrict and rank the query.
//! 3. The query runs through a [`recordhub_storage::RecordStorage`] backend.
//! 4. Rows are formatted into records, requested relations are expanded,
//!    and the result is assembled into a connection.
//!
//! ## Modules
//!
//! - [`context`] - Per-request execution context
//! - [`schema`] - Schema generation and its `[graphql]` configuration
//! - [`resolvers`] - Search, list and delete resolvers
//! - [`selection`] - Relation selection sets
//! - [`handler`] - Axum HTTP handler
//! - [`error`] - Error types

pub mod context;
pub mod error;
pub mod handler;
pub mod resolvers;
pub mod schema;
pub mod selection;

// Re-export main types
pub use context::{
    AuthContext, ContextBuilderError, ExecutionContext, ExecutionContextBuilder,
    ObjectPermission, workspace_schema_name,
};
pub use error::GraphQLError;
pub use handler::{ExecutionContextTemplate, GraphQLState, graphql_handler};
pub use resolvers::{
    Connection, FindManyArgs, PageInfo, SearchArgs, delete_many, find_many, search,
};
pub use schema::{RecordSchemaBuilder, SchemaBuilderConfig};
pub use selection::RelationSelection;

/// Result type for GraphQL operations.
pub type Result<T> = std::result::Result<T, GraphQLError>;
