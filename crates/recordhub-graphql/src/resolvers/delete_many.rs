//! Batch soft-delete resolver.
//!
//! Implements `delete{Plural}(recordIdsToDelete: [ID!]!)`. Every check runs
//! before storage is touched.

use async_graphql::ErrorExtensions;
use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::Value;
use recordhub_core::{ObjectRecord, validate_id};
use tracing::{debug, warn};

use super::format::format_records;
use super::{get_execution_context, json_to_graphql_value};
use crate::context::ExecutionContext;
use crate::error::GraphQLError;

/// Soft-deletes the given records and returns them as deleted.
///
/// Ids that do not exist or are already deleted are skipped.
pub async fn delete_many(
    ctx: &ExecutionContext,
    object_name: &str,
    ids: &[String],
) -> Result<Vec<ObjectRecord>, GraphQLError> {
    let object = ctx.object(object_name)?;

    if !ctx.auth.can_write(&object.name_singular) {
        return Err(GraphQLError::PermissionDenied {
            object: object.name_singular.clone(),
        });
    }
    if object.is_remote {
        return Err(GraphQLError::Validation(format!(
            "remote object '{}' cannot be deleted",
            object.name_singular
        )));
    }
    if ids.is_empty() {
        return Err(GraphQLError::Validation(
            "recordIdsToDelete must not be empty".into(),
        ));
    }
    let max = ctx.limits.batch_request_max_count;
    if ids.len() > max {
        return Err(GraphQLError::Validation(format!(
            "cannot delete {} records at once (maximum {max})",
            ids.len()
        )));
    }
    for id in ids {
        validate_id(id)?;
    }

    let rows = ctx
        .storage
        .soft_delete_many(&ctx.schema_name, &object.name_singular, ids)
        .await
        .map_err(|e| {
            warn!(error = %e, object = %object_name, "Storage error during delete_many");
            GraphQLError::from(e)
        })?;

    debug!(
        object = %object_name,
        requested = ids.len(),
        deleted = rows.len(),
        "Records soft deleted"
    );

    Ok(format_records(rows, object))
}

/// Resolver for `delete{Plural}` mutations.
pub struct DeleteManyResolver;

impl DeleteManyResolver {
    pub fn resolve(
        object_name: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let object_name = object_name.clone();
            FieldFuture::new(async move {
                let exec = get_execution_context(&ctx)?;

                let ids = ctx
                    .args
                    .try_get("recordIdsToDelete")?
                    .list()?
                    .iter()
                    .map(|v| v.string().map(str::to_string))
                    .collect::<Result<Vec<_>, _>>()?;

                let records = delete_many(exec, &object_name, &ids)
                    .await
                    .map_err(|e| e.extend())?;

                Ok(Some(Value::List(
                    records
                        .into_iter()
                        .map(|r| json_to_graphql_value(r.into_value()))
                        .collect(),
                )))
            })
        }
    }
}
