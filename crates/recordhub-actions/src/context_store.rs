//! Explicit client state shared between the record view and its actions.
//!
//! State lives in `tokio::sync::watch` channels: writers replace or modify
//! the value, readers take snapshots or await changes.

use tokio::sync::watch;
use tracing::debug;

use crate::filters::{TargetedRecordsRule, ViewFilter};

/// What the current record view shows and which rows are targeted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextStoreState {
    pub current_view_id: Option<String>,
    pub filters: Vec<ViewFilter>,
    pub targeted_records_rule: TargetedRecordsRule,
    /// Unset until the view has counted its rows.
    pub number_of_selected_records: Option<usize>,
}

impl ContextStoreState {
    pub fn for_view(view_id: impl Into<String>) -> Self {
        Self {
            current_view_id: Some(view_id.into()),
            ..Self::default()
        }
    }

    pub fn has_soft_delete_filter(&self) -> bool {
        self.filters.iter().any(ViewFilter::is_soft_delete_filter)
    }
}

/// Store-and-notify cell for [`ContextStoreState`].
#[derive(Debug, Clone)]
pub struct ContextStore {
    tx: watch::Sender<ContextStoreState>,
}

impl ContextStore {
    pub fn new(state: ContextStoreState) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self { tx }
    }

    pub fn snapshot(&self) -> ContextStoreState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ContextStoreState> {
        self.tx.subscribe()
    }

    /// Applies `f` and notifies subscribers.
    pub fn update(&self, f: impl FnOnce(&mut ContextStoreState)) {
        self.tx.send_modify(f);
    }

    /// Checks exactly `ids`.
    pub fn select_records(&self, ids: Vec<String>) {
        self.update(|state| {
            state.number_of_selected_records = Some(ids.len());
            state.targeted_records_rule = TargetedRecordsRule::Selection {
                selected_record_ids: ids,
            };
        });
    }

    /// Targets every row of the view (`total` of them) except `excluded`.
    pub fn select_all_except(&self, total: usize, excluded: Vec<String>) {
        self.update(|state| {
            state.number_of_selected_records = Some(total.saturating_sub(excluded.len()));
            state.targeted_records_rule = TargetedRecordsRule::Exclusion {
                excluded_record_ids: excluded,
            };
        });
    }
}

/// Identifier of the record table rendering `name_plural` under one view.
pub fn record_table_id(name_plural: &str, view_id: &str) -> String {
    format!("{name_plural}-{view_id}")
}

/// Row selection of one record table.
#[derive(Debug, Clone)]
pub struct RecordTableState {
    table_id: String,
    selected_row_ids: watch::Sender<Vec<String>>,
}

impl RecordTableState {
    pub fn new(name_plural: &str, view_id: &str) -> Self {
        let (selected_row_ids, _rx) = watch::channel(Vec::new());
        Self {
            table_id: record_table_id(name_plural, view_id),
            selected_row_ids,
        }
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn set_selected_rows(&self, ids: Vec<String>) {
        self.selected_row_ids.send_replace(ids);
    }

    pub fn selected_rows(&self) -> Vec<String> {
        self.selected_row_ids.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        self.selected_row_ids.subscribe()
    }

    pub fn reset_selection(&self) {
        debug!(table = %self.table_id, "Resetting row selection");
        self.selected_row_ids.send_replace(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::ViewFilterOperand;
    use serde_json::Value;

    #[test]
    fn test_select_records_updates_count_and_rule() {
        let store = ContextStore::new(ContextStoreState::for_view("v1"));
        store.select_records(vec!["a".into(), "b".into()]);

        let state = store.snapshot();
        assert_eq!(state.number_of_selected_records, Some(2));
        assert_eq!(
            state.targeted_records_rule,
            TargetedRecordsRule::Selection {
                selected_record_ids: vec!["a".into(), "b".into()]
            }
        );
    }

    #[test]
    fn test_select_all_except() {
        let store = ContextStore::new(ContextStoreState::for_view("v1"));
        store.select_all_except(10, vec!["x".into()]);
        assert_eq!(store.snapshot().number_of_selected_records, Some(9));
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let store = ContextStore::new(ContextStoreState::for_view("v1"));
        let mut rx = store.subscribe();
        store.update(|state| {
            state.filters.push(ViewFilter::new(
                "deletedAt",
                ViewFilterOperand::IsNotEmpty,
                Value::Null,
            ))
        });
        rx.changed().await.unwrap();
        assert!(rx.borrow().has_soft_delete_filter());
    }

    #[test]
    fn test_record_table_reset() {
        let table = RecordTableState::new("people", "v1");
        assert_eq!(table.table_id(), "people-v1");
        table.set_selected_rows(vec!["a".into()]);
        assert_eq!(table.selected_rows(), vec!["a".to_string()]);
        table.reset_selection();
        assert!(table.selected_rows().is_empty());
    }
}
