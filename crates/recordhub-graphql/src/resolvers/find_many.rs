//! List resolver with keyset pagination.
//!
//! Implements `{plural}(filter, orderBy, first, after)`.

use async_graphql::ErrorExtensions;
use async_graphql::dynamic::{FieldFuture, ResolverContext};
use recordhub_core::RecordFilter;
use recordhub_query::{SelectQuery, apply_filter_to_builder, compile_filter};
use serde_json::Value;
use tracing::{debug, warn};

use super::connection::{Connection, ConnectionAssembler, ConnectionParams};
use super::cursor::CursorData;
use super::format::format_records;
use super::order::OrderField;
use super::relations::expand_relations;
use super::{filter_arg, get_execution_context, json_arg, json_to_graphql_value, usize_arg};
use crate::context::ExecutionContext;
use crate::error::GraphQLError;
use crate::selection::{RelationSelection, selects_total_count};

/// Arguments of one list query.
#[derive(Debug, Clone, Default)]
pub struct FindManyArgs {
    pub filter: RecordFilter,
    /// Raw `orderBy` input; `id` is appended when absent.
    pub order_by: Option<Value>,
    pub first: Option<usize>,
    pub after: Option<String>,
    pub include_total_count: bool,
    pub relations: RelationSelection,
}

/// Lists records of `object_name`, one page at a time.
pub async fn find_many(
    ctx: &ExecutionContext,
    object_name: &str,
    args: FindManyArgs,
) -> Result<Connection, GraphQLError> {
    let object = ctx.object(object_name)?;
    let order = OrderField::parse_list(args.order_by.as_ref(), object)?;
    let limit = ctx
        .limits
        .effective_limit(args.first.or(Some(ctx.limits.default_page_size)));

    let mut query = SelectQuery::new(&ctx.schema_name, &object.name_singular);
    apply_filter_to_builder(&mut query, &args.filter, object)?;
    let count_query = query.clone();

    if let Some(after) = &args.after {
        let cursor = CursorData::decode(after)
            .ok_or_else(|| GraphQLError::InvalidQuery(format!("invalid cursor '{after}'")))?;
        query.and_where(compile_filter(&cursor.after_filter(&order), object)?);
    }
    for term in &order {
        query.push_order_by(term.to_order_by());
    }
    let query = query.take(limit + 1);

    debug!(object = %object_name, limit = limit, after = ?args.after, "Executing find_many");

    let rows = ctx.storage.find_many(&query).await.map_err(|e| {
        warn!(error = %e, object = %object_name, "Storage error during find_many");
        GraphQLError::from(e)
    })?;

    let has_next_page = rows.len() > limit;
    let mut records = format_records(rows, object);
    records.truncate(limit);

    expand_relations(ctx, object, &mut records, &args.relations, limit).await?;

    let total_count = if args.include_total_count {
        ctx.storage.count(&count_query).await?
    } else {
        0
    };

    Ok(ConnectionAssembler::new(&ctx.objects, limit).assemble(
        object,
        records,
        &ConnectionParams {
            take: limit,
            total_count,
            order: &order,
            has_next_page,
            has_previous_page: args.after.is_some(),
        },
    ))
}

/// Resolver for `{plural}` list fields.
pub struct FindManyResolver;

impl FindManyResolver {
    pub fn resolve(
        object_name: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let object_name = object_name.clone();
            FieldFuture::new(async move {
                let exec = get_execution_context(&ctx)?;
                let object = exec.object(&object_name).map_err(|e| e.extend())?;

                let args = FindManyArgs {
                    filter: filter_arg(&ctx).map_err(|e| e.extend())?,
                    order_by: json_arg(ctx.args.get("orderBy")).map_err(|e| e.extend())?,
                    first: usize_arg(&ctx, "first").map_err(|e| e.extend())?,
                    after: ctx
                        .args
                        .get("after")
                        .and_then(|v| v.string().ok().map(str::to_string)),
                    include_total_count: selects_total_count(ctx.ctx.field()),
                    relations: RelationSelection::from_connection_field(
                        object,
                        &exec.objects,
                        ctx.ctx.field(),
                    ),
                };

                let connection = find_many(exec, &object_name, args)
                    .await
                    .map_err(|e| e.extend())?;
                Ok(Some(json_to_graphql_value(connection.to_json())))
            })
        }
    }
}
