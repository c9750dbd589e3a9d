//! Query construction for RecordHub workspace tables.
//!
//! - [`sql_builder`]: structured predicates, ordering and the [`SelectQuery`] builder
//! - [`filter`]: compiles [`recordhub_core::RecordFilter`] trees into predicates
//! - [`search`]: full-text search terms, predicates, ranking and tsquery evaluation

pub mod filter;
pub mod search;
pub mod sql_builder;

pub use filter::{
    FilterError, FilterOperator, ResolvedColumn, apply_filter_to_builder, compile_filter,
    resolve_column, to_sql_value,
};
pub use search::{
    SearchOperator, SearchTerms, TsQuery, apply_search_to_builder, format_search_terms,
    to_tsvector,
};
pub use sql_builder::{
    BuiltQuery, NullsOrder, Operator, OrderByExpr, Predicate, QueryMode, SelectQuery,
    SortOrder, SqlBuilderError, SqlValue, escape_identifier, validate_identifier,
};
