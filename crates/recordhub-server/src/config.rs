use recordhub_config::{FeatureFlags, QueryLimits};
use recordhub_db_postgres::PostgresConfig;
use recordhub_graphql::SchemaBuilderConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: QueryLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub graphql: SchemaBuilderConfig,
    /// `[[feature_flags]]` entries
    #[serde(default)]
    pub feature_flags: FeatureFlags,
    /// JSON file describing the workspace objects.
    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,
}

fn default_metadata_path() -> String {
    "metadata.json".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            limits: QueryLimits::default(),
            logging: LoggingConfig::default(),
            graphql: SchemaBuilderConfig::default(),
            feature_flags: FeatureFlags::default(),
            metadata_path: default_metadata_path(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        self.limits.validate().map_err(|e| e.to_string())?;
        self.graphql.validate()?;
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Storage validation
        match self.storage.backend {
            StorageBackend::Memory => {
                if self.storage.memory.workspaces.is_empty() {
                    return Err("storage.memory.workspaces must not be empty".into());
                }
            }
            StorageBackend::Postgres => {
                let Some(pg) = &self.storage.postgres else {
                    return Err("storage.backend = \"postgres\" requires [storage.postgres]".into());
                };
                pg.validate().map_err(|e| e.to_string())?;
            }
        }
        if self.metadata_path.trim().is_empty() {
            return Err("metadata_path must not be empty".into());
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    2 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub memory: MemoryStorageConfig,
    #[serde(default)]
    pub postgres: Option<PostgresConfig>,
}

/// In-memory tables only exist for the workspaces listed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStorageConfig {
    #[serde(default = "default_workspaces")]
    pub workspaces: Vec<String>,
    /// Optional JSON file of `{ "<object>": [rows...] }` loaded into every workspace.
    #[serde(default)]
    pub seed_path: Option<String>,
}

fn default_workspaces() -> Vec<String> {
    vec!["default".into()]
}

impl Default for MemoryStorageConfig {
    fn default() -> Self {
        Self {
            workspaces: default_workspaces(),
            seed_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    /// Prefix of environment overrides, e.g. `RECORDHUB__SERVER__PORT=9090`.
    pub const ENV_PREFIX: &str = "RECORDHUB";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("recordhub.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<AppConfig, String> {
        let p = path.as_ref().to_string_lossy().to_string();
        load_config(Some(&p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordhub_config::{FeatureContext, FeatureFlagKey};
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.addr().port(), 8080);
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
            metadata_path = "demos/metadata.json"

            [server]
            host = "127.0.0.1"
            port = 9191

            [storage]
            backend = "postgres"

            [storage.postgres]
            url = "postgres://localhost/recordhub_test"
            pool_size = 4
            statement_timeout_ms = 15000

            [graphql]
            max_depth = 8
            introspection = false

            [limits]
            query_max_records = 100
            default_page_size = 50

            [logging]
            level = "debug"

            [[feature_flags]]
            key = "IS_NEW_RELATION_ENABLED"
            enabled = true
            type = "workspace_based"
            allowed_workspaces = ["acme"]
            "#,
        );

        let cfg = loader::load_config_from_path(file.path()).unwrap();
        assert_eq!(cfg.server.port, 9191);
        assert_eq!(cfg.addr().to_string(), "127.0.0.1:9191");
        assert_eq!(cfg.storage.backend, StorageBackend::Postgres);
        let pg = cfg.storage.postgres.as_ref().unwrap();
        assert_eq!(pg.pool_size, 4);
        assert_eq!(pg.connect_timeout_ms, 5000);
        assert_eq!(pg.statement_timeout_ms, Some(15_000));
        assert_eq!(pg.effective_min_connections(), 1);
        assert!(cfg.graphql.enabled);
        assert_eq!(cfg.graphql.max_depth, 8);
        assert!(!cfg.graphql.introspection_enabled);
        assert_eq!(cfg.limits.query_max_records, 100);
        assert_eq!(cfg.limits.batch_request_max_count, 10_000);
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.metadata_path, "demos/metadata.json");
        assert!(cfg.feature_flags.is_enabled(
            FeatureFlagKey::IsNewRelationEnabled,
            &FeatureContext::with_workspace("acme")
        ));
        assert!(!cfg.feature_flags.is_enabled(
            FeatureFlagKey::IsNewRelationEnabled,
            &FeatureContext::with_workspace("globex")
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let cfg = loader::load_config(Some("/nonexistent/recordhub.toml")).unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.memory.workspaces, vec!["default".to_string()]);
    }

    #[test]
    fn test_validation_errors() {
        let mut cfg = AppConfig::default();
        cfg.storage.backend = StorageBackend::Postgres;
        assert!(cfg.validate().unwrap_err().contains("storage.postgres"));
        cfg.storage.postgres = Some(PostgresConfig::default().with_pool_size(2).with_min_connections(3));
        assert!(cfg.validate().unwrap_err().contains("min_connections"));

        let mut cfg = AppConfig::default();
        cfg.graphql.max_depth = 0;
        assert!(cfg.validate().unwrap_err().contains("graphql.max_depth"));

        let mut cfg = AppConfig::default();
        cfg.limits.default_page_size = cfg.limits.query_max_records + 1;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.storage.memory.workspaces.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_invalid_limits_in_file_fail_to_load() {
        let file = write_config(
            r#"
            [limits]
            query_max_records = 0
            "#,
        );
        assert!(loader::load_config_from_path(file.path()).is_err());
    }
}
