//! # recordhub-actions
//!
//! Client-side record actions for RecordHub.
//!
//! UI state is held explicitly in a [`ContextStore`] (current view, view
//! filters, targeted records) and a [`RecordTableState`] (row selection).
//! Actions read that state, decide whether they are offered and talk to
//! the backend through a [`RecordsApi`].
//!
//! ## Modules
//!
//! - [`context_store`] - Store-and-notify view state
//! - [`filters`] - View filters and targeted-record rules
//! - [`api`] - Records API trait and the in-process implementation
//! - [`delete_records`] - Delete-selection action
//! - [`error`] - Error types

pub mod api;
pub mod context_store;
pub mod delete_records;
pub mod error;
pub mod filters;

pub use api::{DynRecordsApi, IdPage, LocalRecordsApi, RecordsApi, fetch_all_record_ids};
pub use context_store::{ContextStore, ContextStoreState, RecordTableState, record_table_id};
pub use delete_records::DeleteMultipleRecordsAction;
pub use error::{ActionError, Result};
pub use filters::{
    TargetedRecordsRule, ViewFilter, ViewFilterOperand, compute_context_store_filters,
};
