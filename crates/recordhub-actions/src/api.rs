//! Records API used by client actions.

use std::sync::Arc;

use async_trait::async_trait;
use recordhub_core::{ObjectRecord, RecordFilter};
use recordhub_graphql::{ExecutionContext, FindManyArgs, delete_many, find_many};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// One page of record ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdPage {
    pub ids: Vec<String>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// Backend operations the record actions need.
#[async_trait]
pub trait RecordsApi: Send + Sync {
    /// Fetches ids of records matching `filter`, `first` at a time after `after`.
    async fn find_record_ids(
        &self,
        object_name_singular: &str,
        filter: &RecordFilter,
        first: usize,
        after: Option<String>,
    ) -> Result<IdPage>;

    /// Soft-deletes `ids` in one batch.
    async fn delete_many_records(
        &self,
        object_name_singular: &str,
        ids: &[String],
    ) -> Result<Vec<ObjectRecord>>;
}

pub type DynRecordsApi = Arc<dyn RecordsApi>;

/// Fetches the ids of every record matching `filter`.
///
/// Pages are requested one after another until the last one.
pub async fn fetch_all_record_ids(
    api: &dyn RecordsApi,
    object_name_singular: &str,
    filter: &RecordFilter,
    page_size: usize,
) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut after = None;
    let mut pages = 0usize;

    loop {
        let page = api
            .find_record_ids(object_name_singular, filter, page_size, after)
            .await?;
        pages += 1;
        ids.extend(page.ids);
        match (page.has_next_page, page.end_cursor) {
            (true, Some(cursor)) => after = Some(cursor),
            _ => break,
        }
    }

    debug!(
        object = %object_name_singular,
        count = ids.len(),
        pages = pages,
        "Fetched all record ids"
    );
    Ok(ids)
}

/// [`RecordsApi`] backed by the in-process resolvers.
#[derive(Clone)]
pub struct LocalRecordsApi {
    context: Arc<ExecutionContext>,
}

impl LocalRecordsApi {
    pub fn new(context: Arc<ExecutionContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl RecordsApi for LocalRecordsApi {
    async fn find_record_ids(
        &self,
        object_name_singular: &str,
        filter: &RecordFilter,
        first: usize,
        after: Option<String>,
    ) -> Result<IdPage> {
        let connection = find_many(
            &self.context,
            object_name_singular,
            FindManyArgs {
                filter: filter.clone(),
                first: Some(first),
                after,
                ..Default::default()
            },
        )
        .await?;

        Ok(IdPage {
            ids: connection
                .nodes()
                .filter_map(|node| node.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect(),
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
        })
    }

    async fn delete_many_records(
        &self,
        object_name_singular: &str,
        ids: &[String],
    ) -> Result<Vec<ObjectRecord>> {
        Ok(delete_many(&self.context, object_name_singular, ids).await?)
    }
}
