use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Top-level configuration, usually read from `extract-class.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExtractClassConfig {
    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Code-style prefixes and suffixes for generated variable names.
///
/// With `field_prefix = "my"` a property `count` is stored in `myCount` and a
/// field `myCount` gets accessors `getCount`/`setCount`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    #[serde(default)]
    pub field_prefix: String,
    #[serde(default)]
    pub field_suffix: String,

    #[serde(default)]
    pub static_field_prefix: String,
    #[serde(default)]
    pub static_field_suffix: String,

    #[serde(default)]
    pub parameter_prefix: String,
    #[serde(default)]
    pub parameter_suffix: String,

    #[serde(default)]
    pub local_prefix: String,
    #[serde(default)]
    pub local_suffix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Either a simple level (`info`, `debug`, ...) or an `EnvFilter` directive.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    /// The configured level as filter directives; bare level names are
    /// lowercased and `warning` is accepted for `warn`.
    fn level_directives(&self) -> String {
        let level = self.level.trim();
        let lower = level.to_ascii_lowercase();
        match lower.as_str() {
            "" => Self::default_level(),
            "warning" => "warn".to_owned(),
            "trace" | "debug" | "info" | "warn" | "error" => lower,
            _ => level.to_owned(),
        }
    }

    /// The effective filter: the configured level followed by `RUST_LOG`.
    ///
    /// Directives that fail to parse fall back to the configured level alone,
    /// then to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        let level = self.level_directives();
        let env = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let directives = match env {
            Some(env) => format!("{level},{env}"),
            None => level.clone(),
        };
        EnvFilter::try_new(directives)
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_owned())
    }
}

impl ExtractClassConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// JSON schema for editor integration.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ExtractClassConfig)
    }
}
