//! Startup wiring: object metadata, storage backend and optional seed data.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use recordhub_core::ObjectMetadataMaps;
use recordhub_db_memory::InMemoryStorage;
use recordhub_db_postgres::PostgresStorage;
use recordhub_graphql::workspace_schema_name;
use recordhub_storage::{DynStorage, RawRow, RecordStorage, StorageError};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::config::{AppConfig, StorageBackend};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid object metadata: {0}")]
    Metadata(#[from] recordhub_core::CoreError),

    #[error("invalid seed file: {0}")]
    Seed(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

fn read_file(path: &str) -> Result<String, BootstrapError> {
    std::fs::read_to_string(Path::new(path)).map_err(|source| BootstrapError::Read {
        path: path.to_string(),
        source,
    })
}

/// Loads the workspace object metadata from its JSON file.
pub fn load_metadata(path: &str) -> Result<ObjectMetadataMaps, BootstrapError> {
    let objects = ObjectMetadataMaps::from_json(&read_file(path)?)?;
    info!(path = %path, objects = objects.len(), "Object metadata loaded");
    Ok(objects)
}

/// Creates the configured storage backend.
pub async fn create_storage(
    cfg: &AppConfig,
    objects: &ObjectMetadataMaps,
) -> Result<DynStorage, BootstrapError> {
    match cfg.storage.backend {
        StorageBackend::Memory => {
            let storage = InMemoryStorage::new();
            let seed = match &cfg.storage.memory.seed_path {
                Some(path) => Some(parse_seed(&read_file(path)?)?),
                None => None,
            };

            for workspace in &cfg.storage.memory.workspaces {
                let schema = workspace_schema_name(workspace);
                for object in objects.iter() {
                    storage.register_object(&schema, object).await;
                }
                if let Some(seed) = &seed {
                    let rows = seed_workspace(&storage, &schema, seed).await?;
                    info!(workspace = %workspace, rows = rows, "Seed data loaded");
                }
            }

            info!(
                workspaces = cfg.storage.memory.workspaces.len(),
                "Using in-memory storage"
            );
            Ok(Arc::new(storage))
        }
        StorageBackend::Postgres => {
            let pg_config = cfg.storage.postgres.clone().unwrap_or_default();
            let storage = PostgresStorage::new(&pg_config).await.map_err(StorageError::from)?;
            info!("Using PostgreSQL storage");
            Ok(Arc::new(storage))
        }
    }
}

/// `{ "<object>": [rows...] }`
fn parse_seed(json: &str) -> Result<HashMap<String, Vec<RawRow>>, BootstrapError> {
    let value: Value = serde_json::from_str(json).map_err(|e| BootstrapError::Seed(e.to_string()))?;
    let Value::Object(tables) = value else {
        return Err(BootstrapError::Seed("expected an object keyed by object name".into()));
    };

    tables
        .into_iter()
        .map(|(table, rows)| {
            let Value::Array(rows) = rows else {
                return Err(BootstrapError::Seed(format!("'{table}' must be an array of rows")));
            };
            let rows = rows
                .into_iter()
                .map(|row| match row {
                    Value::Object(map) => Ok(map),
                    _ => Err(BootstrapError::Seed(format!("'{table}' rows must be objects"))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((table, rows))
        })
        .collect()
}

async fn seed_workspace(
    storage: &InMemoryStorage,
    schema: &str,
    seed: &HashMap<String, Vec<RawRow>>,
) -> Result<usize, BootstrapError> {
    let mut count = 0;
    for (table, rows) in seed {
        for row in rows {
            storage.insert(schema, table, row.clone()).await?;
            count += 1;
        }
    }
    Ok(count)
}
