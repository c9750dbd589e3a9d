use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use recordhub_core::ObjectMetadataMaps;
use recordhub_graphql::{
    ExecutionContextTemplate, GraphQLState, RecordSchemaBuilder, graphql_handler,
};
use recordhub_storage::DynStorage;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::bootstrap;
use crate::config::AppConfig;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    storage: &'static str,
}

pub struct RecordHubServer {
    addr: SocketAddr,
    app: Router,
}

/// Builds the router serving `POST /graphql` and `GET /health`.
pub fn build_app(
    cfg: &AppConfig,
    objects: Arc<ObjectMetadataMaps>,
    storage: DynStorage,
) -> anyhow::Result<Router> {
    let backend = storage.backend_name();
    let mut router = Router::new().route(
        "/health",
        get(move || async move {
            (
                StatusCode::OK,
                Json(HealthResponse {
                    status: "ok",
                    storage: backend,
                }),
            )
                .into_response()
        }),
    );

    if cfg.graphql.enabled {
        let schema = RecordSchemaBuilder::new(objects.clone(), cfg.graphql.clone()).build()?;
        let state = GraphQLState {
            schema,
            context_template: ExecutionContextTemplate {
                objects,
                storage,
                limits: cfg.limits,
                feature_flags: Arc::new(cfg.feature_flags.clone()),
            },
        };
        router = router.route("/graphql", post(graphql_handler).with_state(state));
    } else {
        tracing::info!("GraphQL endpoint disabled");
    }

    Ok(router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let request_id = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        request_id = %request_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(cfg.server.body_limit_bytes)))
}

pub struct ServerBuilder {
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    /// Loads metadata, connects storage and builds the router.
    pub async fn build(self) -> anyhow::Result<RecordHubServer> {
        let objects = Arc::new(bootstrap::load_metadata(&self.config.metadata_path)?);
        let storage = bootstrap::create_storage(&self.config, &objects).await?;
        let app = build_app(&self.config, objects, storage)?;

        Ok(RecordHubServer {
            addr: self.config.addr(),
            app,
        })
    }
}

impl RecordHubServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
