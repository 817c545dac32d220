//! Configuration loading from multiple sources

use crate::{AppConfig, ConfigError, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;

/// Default prefix for environment overrides
pub const ENV_PREFIX: &str = "RWA_ISSUANCE";

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// Supports TOML, YAML, and JSON formats based on file extension
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;

        match extension {
            "toml" => Self::from_toml(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}",
                extension
            ))),
        }
    }

    pub fn from_toml(content: &str) -> Result<AppConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn from_yaml(content: &str) -> Result<AppConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    pub fn from_json(content: &str) -> Result<AppConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from environment variables
    ///
    /// Uses default prefix "RWA_ISSUANCE"
    pub fn from_env() -> Result<AppConfig> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load configuration from environment variables with custom prefix
    ///
    /// Sections and keys are separated by a double underscore, e.g.
    /// `RWA_ISSUANCE_NETWORK__LOG_LEVEL=debug`
    pub fn from_env_with_prefix(prefix: &str) -> Result<AppConfig> {
        let config = Config::builder().add_source(env_source(prefix)).build()?;

        config.try_deserialize().map_err(ConfigError::from)
    }

    /// Merge two configurations, with overlay taking precedence
    ///
    /// Sections are replaced wholesale; an unset sqlite path keeps the base's.
    pub fn merge(base: AppConfig, overlay: AppConfig) -> AppConfig {
        let mut store = overlay.store;
        if store.sqlite_path.is_none() {
            store.sqlite_path = base.store.sqlite_path;
        }

        AppConfig {
            network: overlay.network,
            executor: overlay.executor,
            contracts: overlay.contracts,
            deployment: overlay.deployment,
            integration: overlay.integration,
            store,
        }
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Individual keys set in the environment replace the file's values;
    /// everything else comes from the file.
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<AppConfig> {
        Self::builder()
            .add_file(path, true)
            .add_env(env_prefix)
            .build()
    }

    /// Build configuration using the config crate's builder pattern
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
            error: None,
        }
    }
}

fn env_source(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Builder for layered configuration loading
pub struct ConfigLoaderBuilder {
    builder: ConfigBuilder<config::builder::DefaultState>,
    error: Option<ConfigError>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self.builder.add_source(env_source(prefix));
        self
    }

    /// Set a default value for a key.
    ///
    /// An invalid key is reported by `build`.
    pub fn set_default(mut self, key: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.builder.clone().set_default(key, value) {
            Ok(builder) => self.builder = builder,
            Err(e) => self.error = Some(ConfigError::from(e)),
        }
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<AppConfig> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let config = self.builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }
}
