//! End-to-end delete-selection flow against the in-memory backend.

use std::sync::Arc;

use recordhub_actions::{
    ContextStore, ContextStoreState, DeleteMultipleRecordsAction, LocalRecordsApi,
    RecordTableState, ViewFilter, ViewFilterOperand,
};
use recordhub_config::QueryLimits;
use recordhub_core::{FieldMetadata, FieldMetadataType, ObjectMetadataItem, ObjectMetadataMaps};
use recordhub_db_memory::InMemoryStorage;
use recordhub_graphql::{AuthContext, ExecutionContext, FindManyArgs, find_many, workspace_schema_name};
use recordhub_storage::RecordStorage;
use serde_json::{Value, json};

const WORKSPACE: &str = "acme";

struct Setup {
    context: Arc<ExecutionContext>,
    object: ObjectMetadataItem,
    ids_by_city: Vec<(String, String)>,
}

async fn setup(rows: usize) -> Setup {
    let object = ObjectMetadataItem::new("person", "people")
        .with_field(FieldMetadata::new("city", FieldMetadataType::Text));
    let objects = Arc::new(ObjectMetadataMaps::from_items(vec![object]).unwrap());
    let schema = workspace_schema_name(WORKSPACE);
    let storage = InMemoryStorage::with_workspace(&schema, &objects);

    let mut ids_by_city = Vec::new();
    for i in 0..rows {
        let city = if i % 2 == 0 { "Paris" } else { "Lyon" };
        let Value::Object(row) = json!({"city": city}) else {
            unreachable!()
        };
        let inserted = storage.insert(&schema, "person", row).await.unwrap();
        ids_by_city.push((
            inserted["id"].as_str().unwrap().to_string(),
            city.to_string(),
        ));
    }

    let context = ExecutionContext::builder()
        .with_auth(AuthContext::new(WORKSPACE))
        .with_objects(objects.clone())
        .with_storage(Arc::new(storage))
        .build()
        .unwrap();

    Setup {
        context: Arc::new(context),
        object: objects.get_by_name_singular("person").unwrap().clone(),
        ids_by_city,
    }
}

async fn remaining_cities(context: &ExecutionContext) -> Vec<String> {
    let mut cities = Vec::new();
    let mut after = None;
    loop {
        let page = find_many(
            context,
            "person",
            FindManyArgs {
                after,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        cities.extend(
            page.nodes()
                .filter_map(|n| n["city"].as_str().map(str::to_string)),
        );
        if !page.page_info.has_next_page {
            return cities;
        }
        after = page.page_info.end_cursor.clone();
    }
}

fn action(setup: &Setup, store: ContextStore) -> DeleteMultipleRecordsAction {
    DeleteMultipleRecordsAction::new(
        setup.object.clone(),
        store,
        RecordTableState::new("people", "all"),
        Arc::new(LocalRecordsApi::new(setup.context.clone())),
        true,
        QueryLimits::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_delete_all_matching_spans_several_pages() {
    // 150 rows, 75 in Paris: more than one page of ids.
    let setup = setup(150).await;
    let excluded = setup
        .ids_by_city
        .iter()
        .find(|(_, city)| city == "Paris")
        .map(|(id, _)| id.clone())
        .unwrap();

    let store = ContextStore::new(ContextStoreState {
        filters: vec![ViewFilter::new("city", ViewFilterOperand::Is, json!("Paris"))],
        ..ContextStoreState::for_view("all")
    });
    store.select_all_except(75, vec![excluded]);

    let action = action(&setup, store);
    assert!(action.should_be_registered());

    let deleted = action.confirm().await.unwrap();
    assert_eq!(deleted.len(), 74);

    let remaining = remaining_cities(&setup.context).await;
    assert_eq!(remaining.len(), 76);
    assert_eq!(remaining.iter().filter(|c| *c == "Paris").count(), 1);
}

#[tokio::test]
async fn test_delete_explicit_selection() {
    let setup = setup(5).await;
    let selected: Vec<String> = setup.ids_by_city.iter().take(2).map(|(id, _)| id.clone()).collect();

    let store = ContextStore::new(ContextStoreState::for_view("all"));
    store.select_records(selected);

    let action = action(&setup, store);
    action.on_click();
    assert!(action.is_modal_open());

    let deleted = action.confirm().await.unwrap();
    assert_eq!(deleted.len(), 2);
    assert_eq!(remaining_cities(&setup.context).await.len(), 3);
}
