//! Per-request execution context.
//!
//! The context bundles everything a resolver needs: the caller's auth
//! context, the workspace object metadata, the feature flags resolved for
//! the workspace, the storage handle and the query limits. It is built once
//! per request and handed to async-graphql as request data.
//!
//! # Example
//!
//! ```ignore
//! use recordhub_graphql::{AuthContext, ExecutionContext};
//!
//! let context = ExecutionContext::builder()
//!     .with_auth(AuthContext::new("acme"))
//!     .with_objects(objects.clone())
//!     .with_storage(storage.clone())
//!     .with_request_id("req-123")
//!     .build()?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use recordhub_config::{FeatureFlagKey, FeatureFlagMap, QueryLimits};
use recordhub_core::{ObjectMetadataItem, ObjectMetadataMaps};
use recordhub_storage::DynStorage;

use crate::error::GraphQLError;

/// Access level of the caller on one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectPermission {
    Read,
    Write,
}

impl std::str::FromStr for ObjectPermission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            other => Err(format!("unknown permission '{other}'")),
        }
    }
}

/// Identity and permissions of the caller.
///
/// Token validation happens upstream; this only carries its outcome.
/// Objects without an explicit entry fall back to `default_permission`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub workspace_id: String,
    pub user_id: Option<String>,
    object_permissions: HashMap<String, ObjectPermission>,
    default_permission: ObjectPermission,
}

impl AuthContext {
    /// Creates a context with write access to every object.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            user_id: None,
            object_permissions: HashMap::new(),
            default_permission: ObjectPermission::Write,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Makes objects without an explicit entry read-only.
    #[must_use]
    pub fn read_only_by_default(mut self) -> Self {
        self.default_permission = ObjectPermission::Read;
        self
    }

    #[must_use]
    pub fn with_object_permission(
        mut self,
        object: impl Into<String>,
        permission: ObjectPermission,
    ) -> Self {
        self.object_permissions.insert(object.into(), permission);
        self
    }

    #[must_use]
    pub fn with_object_permissions(
        mut self,
        permissions: HashMap<String, ObjectPermission>,
    ) -> Self {
        self.object_permissions.extend(permissions);
        self
    }

    /// Parses a permission list such as `person:write,company:read`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the malformed entry.
    pub fn parse_permissions(spec: &str) -> Result<HashMap<String, ObjectPermission>, String> {
        spec.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (object, level) = entry
                    .split_once(':')
                    .ok_or_else(|| format!("expected 'object:permission', got '{entry}'"))?;
                Ok((object.trim().to_string(), level.parse()?))
            })
            .collect()
    }

    /// Whether the caller may modify records of `object`.
    #[must_use]
    pub fn can_write(&self, object: &str) -> bool {
        self.object_permissions
            .get(object)
            .copied()
            .unwrap_or(self.default_permission)
            == ObjectPermission::Write
    }
}

/// Schema name holding the tables of a workspace.
#[must_use]
pub fn workspace_schema_name(workspace_id: &str) -> String {
    let sanitized: String = workspace_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    format!("workspace_{sanitized}")
}

/// GraphQL execution context.
///
/// `Clone` and `Send + Sync`; shared state sits behind `Arc`.
#[derive(Clone)]
pub struct ExecutionContext {
    /// Authentication context for the current request.
    pub auth: AuthContext,

    /// Object metadata of the workspace.
    pub objects: Arc<ObjectMetadataMaps>,

    /// Feature flags resolved for the workspace.
    pub feature_flags: FeatureFlagMap,

    /// Record storage.
    pub storage: DynStorage,

    /// Page and batch bounds.
    pub limits: QueryLimits,

    /// Schema holding the workspace tables.
    pub schema_name: String,

    /// Request ID for tracing and correlation.
    pub request_id: String,
}

impl ExecutionContext {
    /// Creates a new builder for ExecutionContext.
    #[must_use]
    pub fn builder() -> ExecutionContextBuilder {
        ExecutionContextBuilder::default()
    }

    /// Looks up an object by singular name.
    ///
    /// # Errors
    ///
    /// Returns `GraphQLError::ObjectNotFound` for unknown objects.
    pub fn object(&self, name_singular: &str) -> Result<&ObjectMetadataItem, GraphQLError> {
        self.objects
            .get_by_name_singular(name_singular)
            .ok_or_else(|| GraphQLError::ObjectNotFound(name_singular.to_string()))
    }

    #[must_use]
    pub fn is_feature_enabled(&self, key: FeatureFlagKey) -> bool {
        self.feature_flags.get(&key).copied().unwrap_or(false)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("auth", &self.auth)
            .field("objects", &self.objects.len())
            .field("feature_flags", &self.feature_flags)
            .field("storage", &self.storage.backend_name())
            .field("limits", &self.limits)
            .field("schema_name", &self.schema_name)
            .field("request_id", &self.request_id)
            .finish()
    }
}

/// Builder for constructing ExecutionContext.
#[derive(Default)]
pub struct ExecutionContextBuilder {
    auth: Option<AuthContext>,
    objects: Option<Arc<ObjectMetadataMaps>>,
    feature_flags: FeatureFlagMap,
    storage: Option<DynStorage>,
    limits: QueryLimits,
    request_id: Option<String>,
}

impl ExecutionContextBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    #[must_use]
    pub fn with_objects(mut self, objects: Arc<ObjectMetadataMaps>) -> Self {
        self.objects = Some(objects);
        self
    }

    #[must_use]
    pub fn with_feature_flags(mut self, flags: FeatureFlagMap) -> Self {
        self.feature_flags = flags;
        self
    }

    #[must_use]
    pub fn with_storage(mut self, storage: DynStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Builds the ExecutionContext.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> Result<ExecutionContext, ContextBuilderError> {
        let auth = self.auth.ok_or(ContextBuilderError::MissingField("auth"))?;
        let objects = self
            .objects
            .ok_or(ContextBuilderError::MissingField("objects"))?;
        let storage = self
            .storage
            .ok_or(ContextBuilderError::MissingField("storage"))?;
        let request_id = self.request_id.unwrap_or_else(|| "internal".to_string());

        Ok(ExecutionContext {
            schema_name: workspace_schema_name(&auth.workspace_id),
            auth,
            objects,
            feature_flags: self.feature_flags,
            storage,
            limits: self.limits,
            request_id,
        })
    }
}

/// Errors that can occur when building an ExecutionContext.
#[derive(Debug, thiserror::Error)]
pub enum ContextBuilderError {
    /// A required field was not provided.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_missing_auth() {
        let result = ExecutionContextBuilder::new()
            .with_request_id("req-123")
            .build();

        assert!(matches!(
            result,
            Err(ContextBuilderError::MissingField("auth"))
        ));
    }

    #[test]
    fn test_builder_missing_storage() {
        let result = ExecutionContextBuilder::new()
            .with_auth(AuthContext::new("acme"))
            .with_objects(Arc::new(ObjectMetadataMaps::new()))
            .build();

        assert!(matches!(
            result,
            Err(ContextBuilderError::MissingField("storage"))
        ));
    }

    #[test]
    fn test_workspace_schema_name() {
        assert_eq!(workspace_schema_name("Acme"), "workspace_acme");
        assert_eq!(
            workspace_schema_name("3f2a-91"),
            "workspace_3f2a_91"
        );
    }

    #[test]
    fn test_permissions() {
        let auth = AuthContext::new("acme")
            .read_only_by_default()
            .with_object_permission("person", ObjectPermission::Write);
        assert!(auth.can_write("person"));
        assert!(!auth.can_write("company"));

        assert!(AuthContext::new("acme").can_write("anything"));
    }

    #[test]
    fn test_parse_permissions() {
        let parsed = AuthContext::parse_permissions("person:write, company:READ").unwrap();
        assert_eq!(parsed["person"], ObjectPermission::Write);
        assert_eq!(parsed["company"], ObjectPermission::Read);

        assert!(AuthContext::parse_permissions("person").is_err());
        assert!(AuthContext::parse_permissions("person:admin").is_err());
        assert!(AuthContext::parse_permissions("").unwrap().is_empty());
    }
}
