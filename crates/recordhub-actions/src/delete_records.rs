//! "Delete records" action of the multiple-records action menu.
//!
//! The action is offered only when deleting is allowed for the current
//! selection. Clicking opens a confirmation modal; confirming fetches the ids
//! of every targeted record, clears the table selection and soft-deletes
//! the ids in a single batch.

use recordhub_config::{DEFAULT_QUERY_PAGE_SIZE, QueryLimits};
use recordhub_core::{ObjectMetadataItem, ObjectRecord};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::api::{DynRecordsApi, fetch_all_record_ids};
use crate::context_store::{ContextStore, RecordTableState, record_table_id};
use crate::error::{ActionError, Result};
use crate::filters::compute_context_store_filters;

pub struct DeleteMultipleRecordsAction {
    object: ObjectMetadataItem,
    store: ContextStore,
    table: RecordTableState,
    api: DynRecordsApi,
    has_read_only_permission: bool,
    batch_request_max_count: usize,
    page_size: usize,
    modal_open: watch::Sender<bool>,
}

impl DeleteMultipleRecordsAction {
    /// Creates the action for the current view of `store`.
    ///
    /// Fails when the store has no current view or `table` renders another view.
    pub fn new(
        object: ObjectMetadataItem,
        store: ContextStore,
        table: RecordTableState,
        api: DynRecordsApi,
        can_write: bool,
        limits: QueryLimits,
    ) -> Result<Self> {
        let view_id = store
            .snapshot()
            .current_view_id
            .ok_or_else(|| ActionError::validation("Current view ID is not defined"))?;

        let expected = record_table_id(&object.name_plural, &view_id);
        if table.table_id() != expected {
            return Err(ActionError::validation(format!(
                "record table '{}' does not belong to view '{view_id}'",
                table.table_id()
            )));
        }

        let (modal_open, _rx) = watch::channel(false);
        Ok(Self {
            object,
            store,
            table,
            api,
            has_read_only_permission: !can_write,
            batch_request_max_count: limits.batch_request_max_count,
            page_size: DEFAULT_QUERY_PAGE_SIZE.min(limits.query_max_records),
            modal_open,
        })
    }

    /// Whether the action is offered for the current state.
    pub fn should_be_registered(&self) -> bool {
        let state = self.store.snapshot();
        !self.has_read_only_permission
            && !self.object.is_remote
            && !state.has_soft_delete_filter()
            && state
                .number_of_selected_records
                .is_some_and(|count| count > 0 && count < self.batch_request_max_count)
    }

    /// Opens the confirmation modal when the action is offered.
    pub fn on_click(&self) {
        if !self.should_be_registered() {
            return;
        }
        self.modal_open.send_replace(true);
    }

    pub fn is_modal_open(&self) -> bool {
        *self.modal_open.borrow()
    }

    pub fn subscribe_modal(&self) -> watch::Receiver<bool> {
        self.modal_open.subscribe()
    }

    pub fn cancel(&self) {
        self.modal_open.send_replace(false);
    }

    /// Deletes every targeted record.
    ///
    /// The ids are collected before anything is deleted; the delete call
    /// receives exactly that set.
    pub async fn confirm(&self) -> Result<Vec<ObjectRecord>> {
        self.modal_open.send_replace(false);

        let state = self.store.snapshot();
        let filter = compute_context_store_filters(
            &state.targeted_records_rule,
            &state.filters,
            &self.object,
        )?;

        let ids = fetch_all_record_ids(
            self.api.as_ref(),
            &self.object.name_singular,
            &filter,
            self.page_size,
        )
        .await?;

        self.table.reset_selection();

        if ids.is_empty() {
            debug!(object = %self.object.name_singular, "No records left to delete");
            return Ok(Vec::new());
        }

        let deleted = self
            .api
            .delete_many_records(&self.object.name_singular, &ids)
            .await?;

        info!(
            object = %self.object.name_singular,
            requested = ids.len(),
            deleted = deleted.len(),
            "Deleted records"
        );
        Ok(deleted)
    }
}
