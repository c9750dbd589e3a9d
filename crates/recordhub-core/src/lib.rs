//! Core types for RecordHub.
//!
//! - [`metadata`]: per-workspace object and field metadata, plus the
//!   [`ObjectMetadataMaps`] registry resolved once per request
//! - [`record`]: dynamically typed object records
//! - [`filter`]: the declarative [`RecordFilter`] tree
//! - [`error`]: core error type

pub mod error;
pub mod filter;
pub mod id;
pub mod metadata;
pub mod record;

pub use error::{CoreError, Result};
pub use filter::{FilterLeaf, RecordFilter};
pub use id::{generate_id, validate_id};
pub use metadata::{
    CompositeProperty, CompositePropertyKind, FieldMetadata, FieldMetadataType, FieldSettings,
    ObjectMetadataItem, ObjectMetadataMaps, RelationMetadata, RelationType,
};
pub use record::ObjectRecord;

/// Name of the soft-delete timestamp column present on every object.
pub const DELETED_AT_FIELD: &str = "deletedAt";

/// Name of the generated full-text search column.
pub const SEARCH_VECTOR_FIELD: &str = "searchVector";
