//! Nested relation expansion.
//!
//! One bounded follow-up query per requested relation, never one per parent
//! row. Children are matched to parents by join column and attached only
//! after every relation query of the level has succeeded.

use std::collections::HashMap;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, try_join_all};
use recordhub_config::FeatureFlagKey;
use recordhub_core::{FieldMetadata, ObjectMetadataItem, ObjectRecord, RecordFilter, RelationType};
use recordhub_query::{OrderByExpr, SelectQuery, apply_filter_to_builder};
use serde_json::Value;
use tracing::{debug, warn};

use super::format::format_records;
use crate::context::ExecutionContext;
use crate::error::GraphQLError;
use crate::selection::RelationSelection;

/// Join column of a relation field.
///
/// With `IS_NEW_RELATION_ENABLED` the explicit `joinColumnName` setting is
/// required; otherwise the `{field}Id` convention applies.
pub fn join_column(field: &FieldMetadata, new_relations: bool) -> Result<String, GraphQLError> {
    if new_relations {
        field
            .settings
            .join_column_name
            .clone()
            .ok_or_else(|| GraphQLError::relation(&field.name, "join column name is not configured"))
    } else {
        Ok(field.conventional_join_column())
    }
}

/// Everything needed to run one relation query, computed before any I/O.
struct RelationPlan<'a> {
    field_name: String,
    relation_type: RelationType,
    target: &'a ObjectMetadataItem,
    /// Column matched against the parent keys: on the parent for
    /// MANY_TO_ONE, on the target for ONE_TO_MANY.
    join_column: String,
    keys: Vec<String>,
}

impl<'a> RelationPlan<'a> {
    fn new(
        ctx: &'a ExecutionContext,
        object: &ObjectMetadataItem,
        records: &[ObjectRecord],
        relation: &str,
        new_relations: bool,
    ) -> Result<Self, GraphQLError> {
        let field = object.field(relation).ok_or_else(|| {
            GraphQLError::relation(relation, format!("no such field on '{}'", object.name_singular))
        })?;
        let relation_type = field
            .relation_type()
            .ok_or_else(|| GraphQLError::relation(relation, "field is not a relation"))?;
        let target = ctx
            .objects
            .relation_target(field)
            .map_err(|e| GraphQLError::relation(relation, e))?;

        let (join_column, keys) = match relation_type {
            RelationType::ManyToOne => {
                let column = join_column(field, new_relations)?;
                let keys = distinct(records.iter().filter_map(|r| r.get(&column)?.as_str()));
                (column, keys)
            }
            RelationType::OneToMany => {
                let inverse = field
                    .relation
                    .as_ref()
                    .and_then(|r| r.inverse_field_name.as_deref())
                    .and_then(|name| target.field(name))
                    .ok_or_else(|| GraphQLError::relation(relation, "inverse field is missing"))?;
                let column = join_column(inverse, new_relations)
                    .map_err(|e| GraphQLError::relation(relation, e))?;
                (column, distinct(records.iter().filter_map(ObjectRecord::id)))
            }
        };

        Ok(Self {
            field_name: field.name.clone(),
            relation_type,
            target,
            join_column,
            keys,
        })
    }

    fn filter(&self) -> RecordFilter {
        match self.relation_type {
            RelationType::ManyToOne => RecordFilter::in_ids(self.keys.iter().cloned()),
            RelationType::OneToMany => RecordFilter::leaf(
                self.join_column.clone(),
                "in",
                Value::Array(self.keys.iter().cloned().map(Value::String).collect()),
            ),
        }
    }
}

fn distinct<'s>(values: impl Iterator<Item = &'s str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Children fetched for one relation, grouped by the key they attach to.
struct Attachment {
    field_name: String,
    relation_type: RelationType,
    join_column: String,
    children: HashMap<String, Vec<Value>>,
}

impl Attachment {
    fn attach(self, records: &mut [ObjectRecord]) {
        for record in records.iter_mut() {
            let value = match self.relation_type {
                RelationType::ManyToOne => record
                    .get(&self.join_column)
                    .and_then(Value::as_str)
                    .and_then(|key| self.children.get(key))
                    .and_then(|matches| matches.first().cloned())
                    .unwrap_or(Value::Null),
                RelationType::OneToMany => Value::Array(
                    record
                        .id()
                        .and_then(|id| self.children.get(id))
                        .cloned()
                        .unwrap_or_default(),
                ),
            };
            record.set(self.field_name.clone(), value);
        }
    }
}

async fn fetch_relation(
    ctx: &ExecutionContext,
    plan: RelationPlan<'_>,
    nested: &RelationSelection,
    limit: usize,
) -> Result<Attachment, GraphQLError> {
    let mut attachment = Attachment {
        field_name: plan.field_name.clone(),
        relation_type: plan.relation_type,
        join_column: plan.join_column.clone(),
        children: HashMap::new(),
    };
    if plan.keys.is_empty() {
        return Ok(attachment);
    }

    let wrap = |e: GraphQLError| match e {
        GraphQLError::RelationExpansion { .. } => e,
        other => GraphQLError::relation(&plan.field_name, other),
    };

    let mut query = SelectQuery::new(&ctx.schema_name, &plan.target.name_singular);
    apply_filter_to_builder(&mut query, &plan.filter(), plan.target)
        .map_err(|e| wrap(e.into()))?;
    let query = query.order_by(OrderByExpr::asc("id")).take(limit);

    let rows = ctx.storage.find_many(&query).await.map_err(|e| {
        warn!(error = %e, relation = %plan.field_name, "Storage error during relation expansion");
        wrap(e.into())
    })?;

    let mut children = format_records(rows, plan.target);
    expand_relations(ctx, plan.target, &mut children, nested, limit)
        .await
        .map_err(wrap)?;

    let key_column = match plan.relation_type {
        RelationType::ManyToOne => "id",
        RelationType::OneToMany => plan.join_column.as_str(),
    };
    for child in children {
        let Some(key) = child.get(key_column).and_then(Value::as_str).map(str::to_string) else {
            continue;
        };
        attachment.children.entry(key).or_default().push(child.into_value());
    }

    debug!(
        relation = %plan.field_name,
        target = %plan.target.name_singular,
        keys = plan.keys.len(),
        "Relation expanded"
    );
    Ok(attachment)
}

/// Expands `selection` on `records` of `object`, recursively.
///
/// Relation queries of one level run concurrently. Any failure fails the
/// whole expansion with the relation's name and leaves `records` untouched.
pub fn expand_relations<'a>(
    ctx: &'a ExecutionContext,
    object: &'a ObjectMetadataItem,
    records: &'a mut [ObjectRecord],
    selection: &'a RelationSelection,
    limit: usize,
) -> BoxFuture<'a, Result<(), GraphQLError>> {
    async move {
        if selection.is_empty() || records.is_empty() {
            return Ok(());
        }

        let new_relations = ctx.is_feature_enabled(FeatureFlagKey::IsNewRelationEnabled);
        let mut tasks = Vec::with_capacity(selection.len());
        for (relation, nested) in selection.iter() {
            let plan = RelationPlan::new(ctx, object, records, relation, new_relations)?;
            tasks.push(fetch_relation(ctx, plan, nested, limit));
        }

        let attachments = try_join_all(tasks).await?;
        for attachment in attachments {
            attachment.attach(records);
        }
        Ok(())
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_column_modes() {
        let legacy = FieldMetadata::many_to_one("company", "company");
        assert_eq!(join_column(&legacy, false).unwrap(), "companyId");
        assert!(matches!(
            join_column(&legacy, true),
            Err(GraphQLError::RelationExpansion { ref relation, .. }) if relation == "company"
        ));

        let explicit = FieldMetadata::many_to_one("company", "company").with_join_column("employerId");
        assert_eq!(join_column(&explicit, true).unwrap(), "employerId");
        assert_eq!(join_column(&explicit, false).unwrap(), "companyId");
    }

    #[test]
    fn test_distinct_keeps_first_occurrence_order() {
        let keys = distinct(["b", "a", "b", "c"].into_iter());
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
