//! Feature flags for per-workspace behavior toggles
//!
//! Supports two flag types:
//! - Boolean: Simple on/off
//! - Workspace-based: Enabled only for listed workspaces
//!
//! Flags are resolved once per request into a [`FeatureFlagMap`] which is then
//! passed explicitly to resolvers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Known feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureFlagKey {
    /// Resolve relation join columns from explicit field settings instead of naming convention.
    IsNewRelationEnabled,
}

impl FeatureFlagKey {
    pub const ALL: &'static [FeatureFlagKey] = &[FeatureFlagKey::IsNewRelationEnabled];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsNewRelationEnabled => "IS_NEW_RELATION_ENABLED",
        }
    }
}

impl fmt::Display for FeatureFlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flag values active for one request.
pub type FeatureFlagMap = HashMap<FeatureFlagKey, bool>;

/// Context for evaluating feature flags
#[derive(Debug, Clone, Default)]
pub struct FeatureContext {
    /// Workspace the request targets
    pub workspace_id: Option<String>,
}

impl FeatureContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: Some(workspace_id.into()),
        }
    }
}

/// Type of feature flag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureFlagType {
    /// Simple on/off toggle
    #[default]
    Boolean,
    /// Enable for specific workspaces
    WorkspaceBased {
        #[serde(default)]
        allowed_workspaces: Vec<String>,
    },
}

/// A single feature flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub key: FeatureFlagKey,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, flatten)]
    pub flag_type: FeatureFlagType,
    #[serde(default)]
    pub description: Option<String>,
}

impl FeatureFlag {
    /// Create a new boolean feature flag
    pub fn boolean(key: FeatureFlagKey, enabled: bool) -> Self {
        Self {
            key,
            enabled,
            flag_type: FeatureFlagType::Boolean,
            description: None,
        }
    }

    /// Create a workspace-based feature flag
    pub fn workspace_based(key: FeatureFlagKey, allowed_workspaces: Vec<String>) -> Self {
        Self {
            key,
            enabled: !allowed_workspaces.is_empty(),
            flag_type: FeatureFlagType::WorkspaceBased { allowed_workspaces },
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Evaluate this flag for a given context
    pub fn evaluate(&self, context: &FeatureContext) -> bool {
        if !self.enabled {
            return false;
        }

        match &self.flag_type {
            FeatureFlagType::Boolean => true,
            FeatureFlagType::WorkspaceBased { allowed_workspaces } => context
                .workspace_id
                .as_ref()
                .is_some_and(|id| allowed_workspaces.contains(id)),
        }
    }
}

/// Collection of feature flags, written in TOML as `[[feature_flags]]` entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FeatureFlag>", into = "Vec<FeatureFlag>")]
pub struct FeatureFlags {
    flags: HashMap<FeatureFlagKey, FeatureFlag>,
}

impl From<Vec<FeatureFlag>> for FeatureFlags {
    fn from(list: Vec<FeatureFlag>) -> Self {
        let mut flags = Self::new();
        for flag in list {
            flags.set(flag);
        }
        flags
    }
}

impl From<FeatureFlags> for Vec<FeatureFlag> {
    fn from(flags: FeatureFlags) -> Self {
        flags.flags.into_values().collect()
    }
}

impl FeatureFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, flag: FeatureFlag) {
        self.flags.insert(flag.key, flag);
    }

    pub fn get(&self, key: FeatureFlagKey) -> Option<&FeatureFlag> {
        self.flags.get(&key)
    }

    pub fn is_enabled(&self, key: FeatureFlagKey, context: &FeatureContext) -> bool {
        self.flags
            .get(&key)
            .is_some_and(|flag| flag.evaluate(context))
    }

    /// Evaluate every known flag for one request. Unset flags resolve to false.
    pub fn resolve(&self, context: &FeatureContext) -> FeatureFlagMap {
        FeatureFlagKey::ALL
            .iter()
            .map(|key| (*key, self.is_enabled(*key, context)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
