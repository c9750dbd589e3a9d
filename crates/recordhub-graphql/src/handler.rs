//! Axum HTTP handler for the GraphQL endpoint.
//!
//! `POST /graphql` executes one GraphQL request. Identity arrives in
//! headers set by the upstream gateway:
//!
//! - `x-workspace-id` (required): workspace whose tables are queried
//! - `x-user-id` (optional)
//! - `x-object-permissions` (optional): `person:write,company:read`; when
//!   present, objects it does not list are read-only
//!
//! GraphQL errors are returned with `200 OK` as the protocol requires;
//! requests rejected before execution get the error's HTTP status.

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response, Variables};
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use recordhub_config::{FeatureContext, FeatureFlags, QueryLimits};
use recordhub_core::ObjectMetadataMaps;
use recordhub_storage::DynStorage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::{AuthContext, ExecutionContext};
use crate::error::GraphQLError;

pub const WORKSPACE_HEADER: &str = "x-workspace-id";
pub const USER_HEADER: &str = "x-user-id";
pub const PERMISSIONS_HEADER: &str = "x-object-permissions";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// State shared across GraphQL handlers.
#[derive(Clone)]
pub struct GraphQLState {
    pub schema: Schema,

    /// Shared dependencies cloned into each request's context.
    pub context_template: ExecutionContextTemplate,
}

/// Template for building per-request execution context.
#[derive(Clone)]
pub struct ExecutionContextTemplate {
    pub objects: Arc<ObjectMetadataMaps>,
    pub storage: DynStorage,
    pub limits: QueryLimits,
    pub feature_flags: Arc<FeatureFlags>,
}

/// GraphQL request body.
#[derive(Debug, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL query string.
    pub query: String,

    /// Optional operation name for multi-operation documents.
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,

    /// Optional variables for the query.
    pub variables: Option<serde_json::Value>,
}

/// GraphQL response body.
#[derive(Debug, Serialize)]
pub struct GraphQLResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<serde_json::Value>,
}

impl From<Response> for GraphQLResponse {
    fn from(resp: Response) -> Self {
        let data_json = serde_json::to_value(&resp.data).unwrap_or(serde_json::Value::Null);
        let data = if data_json.is_null() {
            None
        } else {
            Some(data_json)
        };

        // ServerError serializes message, locations, path and extensions.
        let errors = resp
            .errors
            .iter()
            .map(|e| serde_json::to_value(e).unwrap_or(serde_json::Value::Null))
            .collect();

        Self { data, errors }
    }
}

/// Handles POST requests to /graphql.
pub async fn graphql_handler(
    State(state): State<GraphQLState>,
    headers: HeaderMap,
    Json(request): Json<GraphQLRequest>,
) -> impl IntoResponse {
    let context = match build_context(&state.context_template, &headers) {
        Ok(ctx) => ctx,
        Err(e) => {
            warn!(error = %e, "Rejected GraphQL request");
            return error_response(e).into_response();
        }
    };

    debug!(
        workspace = %context.auth.workspace_id,
        user = ?context.auth.user_id,
        request_id = %context.request_id,
        "Processing GraphQL request"
    );

    let mut gql_request = Request::new(&request.query);
    if let Some(op_name) = request.operation_name {
        gql_request = gql_request.operation_name(op_name);
    }
    if let Some(vars) = request.variables {
        gql_request = gql_request.variables(Variables::from_json(vars));
    }
    gql_request = gql_request.data(context);

    let response = state.schema.execute(gql_request).await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(GraphQLResponse::from(response)),
    )
        .into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Builds the auth context from request headers.
pub fn auth_from_headers(headers: &HeaderMap) -> Result<AuthContext, GraphQLError> {
    let workspace_id = header_str(headers, WORKSPACE_HEADER).ok_or_else(|| {
        GraphQLError::Validation(format!("missing {WORKSPACE_HEADER} header"))
    })?;

    let mut auth = AuthContext::new(workspace_id);
    if let Some(user) = header_str(headers, USER_HEADER) {
        auth = auth.with_user(user);
    }
    if let Some(spec) = header_str(headers, PERMISSIONS_HEADER) {
        let permissions = AuthContext::parse_permissions(spec)
            .map_err(|e| GraphQLError::Validation(format!("invalid {PERMISSIONS_HEADER}: {e}")))?;
        auth = auth
            .read_only_by_default()
            .with_object_permissions(permissions);
    }
    Ok(auth)
}

/// Builds a request's execution context from the template.
fn build_context(
    template: &ExecutionContextTemplate,
    headers: &HeaderMap,
) -> Result<ExecutionContext, GraphQLError> {
    let auth = auth_from_headers(headers)?;
    let flags = template
        .feature_flags
        .resolve(&FeatureContext::with_workspace(auth.workspace_id.clone()));
    let request_id = header_str(headers, REQUEST_ID_HEADER).unwrap_or("unknown");

    ExecutionContext::builder()
        .with_auth(auth)
        .with_objects(template.objects.clone())
        .with_storage(template.storage.clone())
        .with_limits(template.limits)
        .with_feature_flags(flags)
        .with_request_id(request_id)
        .build()
        .map_err(|e| GraphQLError::Internal(e.to_string()))
}

/// Returns an error response.
fn error_response(error: GraphQLError) -> impl IntoResponse {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = serde_json::json!({
        "errors": [{
            "message": error.to_string(),
            "extensions": {
                "code": error.error_code()
            }
        }]
    });

    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_graphql_request_deserialize() {
        let json = r#"{
            "query": "{ people { totalCount } }",
            "operationName": "People",
            "variables": {"foo": "bar"}
        }"#;

        let request: GraphQLRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.query, "{ people { totalCount } }");
        assert_eq!(request.operation_name, Some("People".to_string()));
        assert!(request.variables.is_some());
    }

    #[test]
    fn test_graphql_request_minimal() {
        let request: GraphQLRequest = serde_json::from_str(r#"{"query": "{ a }"}"#).unwrap();
        assert!(request.operation_name.is_none());
        assert!(request.variables.is_none());
    }

    #[test]
    fn test_auth_requires_workspace() {
        let result = auth_from_headers(&HeaderMap::new());
        assert!(matches!(result, Err(GraphQLError::Validation(_))));
    }

    #[test]
    fn test_auth_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(WORKSPACE_HEADER, HeaderValue::from_static("acme"));
        headers.insert(USER_HEADER, HeaderValue::from_static("u1"));
        headers.insert(PERMISSIONS_HEADER, HeaderValue::from_static("person:write"));

        let auth = auth_from_headers(&headers).unwrap();
        assert_eq!(auth.workspace_id, "acme");
        assert_eq!(auth.user_id.as_deref(), Some("u1"));
        assert!(auth.can_write("person"));
        assert!(!auth.can_write("company"));
    }

    #[test]
    fn test_auth_without_permissions_header_can_write() {
        let mut headers = HeaderMap::new();
        headers.insert(WORKSPACE_HEADER, HeaderValue::from_static("acme"));
        assert!(auth_from_headers(&headers).unwrap().can_write("company"));
    }

    #[test]
    fn test_invalid_permissions_header() {
        let mut headers = HeaderMap::new();
        headers.insert(WORKSPACE_HEADER, HeaderValue::from_static("acme"));
        headers.insert(PERMISSIONS_HEADER, HeaderValue::from_static("person=write"));
        assert!(auth_from_headers(&headers).is_err());
    }
}
