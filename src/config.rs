//! Runner configuration
//!
//! [`RunnerConfig`] is read from the `migrations` section of
//! `config/tidemark.toml` (optional) and from `TIDEMARK__MIGRATIONS__*`
//! environment variables, e.g. `TIDEMARK__MIGRATIONS__PROVIDER=sqlite`.

use crate::generator::{CompatibilityMode, GeneratorOptions};
use crate::migration::{Conventions, VersionTableMetadata};
use crate::processor::{ExecutionOptions, TransactionMode};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "config/tidemark.toml";
const ENV_PREFIX: &str = "TIDEMARK";

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub connection_string: String,
    #[serde(default)]
    pub preview_only: bool,
    #[serde(default)]
    pub silent_fail: bool,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub transaction_mode: TransactionMode,
    #[serde(default)]
    pub compatibility: CompatibilityMode,
    /// Storage engine for MySQL tables; set to an empty string to omit the clause
    #[serde(default = "default_storage_engine")]
    pub storage_engine: Option<String>,
    #[serde(default)]
    pub default_schema: Option<String>,
    #[serde(default)]
    pub version_table: VersionTableMetadata,
}

fn default_provider() -> String {
    "sqlite".to_string()
}

fn default_storage_engine() -> Option<String> {
    Some("INNODB".to_string())
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            connection_string: String::new(),
            preview_only: false,
            silent_fail: false,
            timeout_seconds: None,
            transaction_mode: TransactionMode::default(),
            compatibility: CompatibilityMode::default(),
            storage_engine: default_storage_engine(),
            default_schema: None,
            version_table: VersionTableMetadata::default(),
        }
    }
}

impl RunnerConfig {
    /// Load from `config/tidemark.toml`, falling back to env vars
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if neither source yields a valid `migrations` section.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from `path` (optional) and env vars
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if neither source yields a valid `migrations` section.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // Unreadable file: warn and retry with env only
                if path.exists() {
                    log::warn!(
                        "Failed to load config file {}, falling back to env: {}",
                        path.display(),
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        match settings.get::<RunnerConfig>("migrations") {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Migration configuration could not be loaded from file or environment: {}",
                e
            ))),
        }
    }

    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            preview_only: self.preview_only,
            silent_fail: self.silent_fail,
            timeout_seconds: self.timeout_seconds,
            transaction_mode: self.transaction_mode,
        }
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            compatibility: self.compatibility,
            storage_engine: self.storage_engine.clone().filter(|e| !e.trim().is_empty()),
        }
    }

    pub fn conventions(&self) -> Conventions {
        Conventions {
            default_schema: self.default_schema.clone(),
        }
    }

    pub fn version_table(&self) -> VersionTableMetadata {
        self.version_table.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let config = RunnerConfig::load_from("does/not/exist.toml").unwrap();
        assert_eq!(config.provider, "sqlite");
        assert_eq!(config.storage_engine.as_deref(), Some("INNODB"));
        assert_eq!(config.version_table.table, "VersionInfo");
        assert!(config.execution_options().begins_transactions());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[migrations]
provider = "postgres"
connection_string = "host=localhost user=postgres"
preview_only = true
silent_fail = true
transaction_mode = "manual"
compatibility = "loose"
storage_engine = ""
default_schema = "app"

[migrations.version_table]
table = "SchemaVersions"
"#
        )
        .unwrap();

        let config = RunnerConfig::load_from(file.path()).unwrap();
        assert_eq!(config.provider, "postgres");
        assert!(config.execution_options().preview_only);
        assert_eq!(config.transaction_mode, TransactionMode::Manual);
        assert_eq!(config.generator_options().compatibility, CompatibilityMode::Loose);
        assert_eq!(config.generator_options().storage_engine, None);
        assert_eq!(config.conventions().default_schema.as_deref(), Some("app"));
        assert_eq!(config.version_table().table, "SchemaVersions");
        assert_eq!(config.version_table().version_column, "Version");
    }

    #[test]
    fn test_malformed_file_warns_and_falls_back_to_env() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[migrations\nprovider = ").unwrap();

        let config = RunnerConfig::load_from(file.path()).unwrap();
        assert_eq!(config.provider, "sqlite");
    }
}
