//! Record resolvers.
//!
//! Each operation exists twice: as a plain async function taking an
//! [`ExecutionContext`] (used by tests and in-process callers) and as an
//! async-graphql dynamic field resolver wrapping it.
//!
//! - `search`: `search{Plural}(searchInput, filter, limit)`
//! - `find_many`: `{plural}(filter, orderBy, first, after)`
//! - `delete_many`: `delete{Plural}(recordIdsToDelete)`

mod connection;
mod cursor;
mod delete_many;
mod find_many;
mod format;
mod order;
mod relations;
mod search;

pub use connection::{Connection, ConnectionAssembler, ConnectionParams, Edge, PageInfo};
pub use cursor::CursorData;
pub use delete_many::{DeleteManyResolver, delete_many};
pub use find_many::{FindManyArgs, FindManyResolver, find_many};
pub use format::{format_record, format_records};
pub use order::{OrderByDirection, OrderField};
pub use relations::{expand_relations, join_column};
pub use search::{SearchArgs, SearchResolver, search};

use async_graphql::dynamic::{ResolverContext, ValueAccessor};
use async_graphql::{ErrorExtensions, Value};
use recordhub_core::RecordFilter;

use crate::context::ExecutionContext;
use crate::error::GraphQLError;

/// Helper to extract the execution context from resolver context.
pub(crate) fn get_execution_context<'a>(
    ctx: &'a ResolverContext<'_>,
) -> Result<&'a ExecutionContext, async_graphql::Error> {
    ctx.data::<ExecutionContext>()
        .map_err(|_| GraphQLError::Internal("execution context not available".into()).extend())
}

/// Convert a serde_json::Value to async_graphql::Value.
pub(crate) fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else if let Some(f) = n.as_f64() {
                Value::Number(
                    async_graphql::Number::from_f64(f)
                        .unwrap_or_else(|| async_graphql::Number::from(0)),
                )
            } else {
                Value::Null
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => {
            Value::List(arr.into_iter().map(json_to_graphql_value).collect())
        }
        serde_json::Value::Object(obj) => {
            let map: async_graphql::indexmap::IndexMap<async_graphql::Name, Value> = obj
                .into_iter()
                .map(|(k, v)| (async_graphql::Name::new(k), json_to_graphql_value(v)))
                .collect();
            Value::Object(map)
        }
    }
}

/// Reads a JSON-scalar argument as serde_json.
pub(crate) fn json_arg(accessor: Option<ValueAccessor<'_>>) -> Result<Option<serde_json::Value>, GraphQLError> {
    accessor
        .map(|v| {
            v.as_value()
                .clone()
                .into_json()
                .map_err(|e| GraphQLError::InvalidQuery(e.to_string()))
        })
        .transpose()
}

/// Parses the `filter` argument.
pub(crate) fn filter_arg(ctx: &ResolverContext<'_>) -> Result<RecordFilter, GraphQLError> {
    match json_arg(ctx.args.get("filter"))? {
        Some(json) => Ok(RecordFilter::from_json(&json)?),
        None => Ok(RecordFilter::empty()),
    }
}

/// Reads a non-negative `Int` argument.
pub(crate) fn usize_arg(ctx: &ResolverContext<'_>, name: &str) -> Result<Option<usize>, GraphQLError> {
    let Some(value) = ctx.args.get(name) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let n = value
        .i64()
        .map_err(|_| GraphQLError::InvalidQuery(format!("'{name}' must be an integer")))?;
    usize::try_from(n)
        .map(Some)
        .map_err(|_| GraphQLError::InvalidQuery(format!("'{name}' must not be negative")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_graphql_value() {
        let value = json_to_graphql_value(json!({"a": [1, 2.5, "x", null, true]}));
        let back = value.into_json().unwrap();
        assert_eq!(back, json!({"a": [1, 2.5, "x", null, true]}));
    }
}
