//! Full-text search resolver.
//!
//! Implements `search{Plural}(searchInput, filter, limit)`: the caller's
//! filter restricts the candidates, the search terms restrict and rank
//! them, and `totalCount` counts the filter matches alone.

use async_graphql::ErrorExtensions;
use async_graphql::dynamic::{FieldFuture, ResolverContext};
use recordhub_core::RecordFilter;
use recordhub_query::{SearchTerms, SelectQuery, apply_filter_to_builder, apply_search_to_builder};
use tracing::{debug, warn};

use super::connection::{Connection, ConnectionAssembler, ConnectionParams};
use super::format::format_records;
use super::order::OrderField;
use super::relations::expand_relations;
use super::{filter_arg, get_execution_context, json_to_graphql_value, usize_arg};
use crate::context::ExecutionContext;
use crate::error::GraphQLError;
use crate::selection::{RelationSelection, selects_total_count};

/// Arguments of one search.
#[derive(Debug, Clone, Default)]
pub struct SearchArgs {
    pub search_input: String,
    pub filter: RecordFilter,
    pub limit: Option<usize>,
    pub include_total_count: bool,
    pub relations: RelationSelection,
}

/// Searches records of `object_name`.
///
/// Blank input returns an empty connection without touching storage.
pub async fn search(
    ctx: &ExecutionContext,
    object_name: &str,
    args: SearchArgs,
) -> Result<Connection, GraphQLError> {
    let object = ctx.object(object_name)?;

    let Some(terms) = SearchTerms::from_input(&args.search_input) else {
        debug!(object = %object_name, "Empty search input");
        return Ok(Connection::empty());
    };

    let limit = ctx.limits.effective_limit(args.limit);

    let mut query = SelectQuery::new(&ctx.schema_name, &object.name_singular);
    apply_filter_to_builder(&mut query, &args.filter, object)?;
    let count_query = query.clone();
    apply_search_to_builder(&mut query, &terms, object)?;
    let query = query.take(limit + 1);

    debug!(
        object = %object_name,
        and_terms = %terms.and_terms,
        or_terms = %terms.or_terms,
        limit = limit,
        "Executing search"
    );

    let rows = ctx.storage.find_many(&query).await.map_err(|e| {
        warn!(error = %e, object = %object_name, "Storage error during search");
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

    debug!(
        object = %object_name,
        count = records.len(),
        total_count = total_count,
        "Search completed"
    );

    Ok(ConnectionAssembler::new(&ctx.objects, limit).assemble(
        object,
        records,
        &ConnectionParams {
            take: limit,
            total_count,
            order: &[OrderField::id()],
            has_next_page,
            has_previous_page: false,
        },
    ))
}

/// Resolver for `search{Plural}` fields.
pub struct SearchResolver;

impl SearchResolver {
    /// Creates a resolver function for searching records of one object.
    pub fn resolve(
        object_name: String,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + Clone {
        move |ctx| {
            let object_name = object_name.clone();
            FieldFuture::new(async move {
                let exec = get_execution_context(&ctx)?;
                let object = exec.object(&object_name).map_err(|e| e.extend())?;

                let args = SearchArgs {
                    search_input: ctx
                        .args
                        .get("searchInput")
                        .and_then(|v| v.string().ok().map(str::to_string))
                        .unwrap_or_default(),
                    filter: filter_arg(&ctx).map_err(|e| e.extend())?,
                    limit: usize_arg(&ctx, "limit").map_err(|e| e.extend())?,
                    include_total_count: selects_total_count(ctx.ctx.field()),
                    relations: RelationSelection::from_connection_field(
                        object,
                        &exec.objects,
                        ctx.ctx.field(),
                    ),
                };

                let connection = search(exec, &object_name, args)
                    .await
                    .map_err(|e| e.extend())?;
                Ok(Some(json_to_graphql_value(connection.to_json())))
            })
        }
    }
}
