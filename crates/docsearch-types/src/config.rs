//! Configuration loading for docsearch.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/docsearch/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::attribute::{Attribute, AttributeKind};
use crate::error::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the tantivy index directory
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Memory budget for the index writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Maximum number of rows a single query returns
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Queries longer than this (in characters) are rejected before parsing
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,

    /// Extracted text is truncated to this many characters when set
    #[serde(default)]
    pub max_extracted_chars: Option<usize>,

    /// Upper bound for loading and extracting a document (ms)
    #[serde(default = "default_extraction_timeout_ms")]
    pub extraction_timeout_ms: u64,

    /// Upper bound for a single index store call (ms)
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Locator attribute that query results are mapped from
    #[serde(default = "default_locator_attribute")]
    pub locator_attribute: String,

    /// When set, results map to `<retrieve_endpoint>/<id>` (any trailing `/` on the
    /// endpoint is dropped first) instead of a stored locator
    #[serde(default)]
    pub retrieve_endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_index_path() -> String {
    ProjectDirs::from("", "", "docsearch")
        .map(|p| p.data_local_dir().join("index"))
        .unwrap_or_else(|| PathBuf::from("./docsearch-index"))
        .to_string_lossy()
        .to_string()
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_max_results() -> usize {
    1000
}

fn default_max_query_length() -> usize {
    5000
}

fn default_extraction_timeout_ms() -> u64 {
    30_000
}

fn default_store_timeout_ms() -> u64 {
    10_000
}

fn default_locator_attribute() -> String {
    Attribute::ResourceLocation.name().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            writer_memory_mb: default_writer_memory_mb(),
            max_results: default_max_results(),
            max_query_length: default_max_query_length(),
            max_extracted_chars: None,
            extraction_timeout_ms: default_extraction_timeout_ms(),
            store_timeout_ms: default_store_timeout_ms(),
            locator_attribute: default_locator_attribute(),
            retrieve_endpoint: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/docsearch/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (DOCSEARCH_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", "docsearch")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("index_path", default_index_path())
            .map_err(|e| ConfigError(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| ConfigError(e.to_string()))?
            .set_default("max_results", default_max_results() as i64)
            .map_err(|e| ConfigError(e.to_string()))?
            .set_default("max_query_length", default_max_query_length() as i64)
            .map_err(|e| ConfigError(e.to_string()))?
            .set_default("extraction_timeout_ms", default_extraction_timeout_ms() as i64)
            .map_err(|e| ConfigError(e.to_string()))?
            .set_default("store_timeout_ms", default_store_timeout_ms() as i64)
            .map_err(|e| ConfigError(e.to_string()))?
            .set_default("locator_attribute", default_locator_attribute())
            .map_err(|e| ConfigError(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| ConfigError(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Keys contain underscores, so nesting uses a double separator:
        // DOCSEARCH_INDEX_PATH, DOCSEARCH_MAX_RESULTS, ...
        builder = builder.add_source(
            Environment::with_prefix("DOCSEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(|e| ConfigError(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ConfigError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match Attribute::parse(&self.locator_attribute) {
            Some(attribute) if attribute.kind() == AttributeKind::Locator => {}
            _ => {
                return Err(ConfigError(format!(
                    "locator_attribute must be one of the *Location attributes, got {}",
                    self.locator_attribute
                )))
            }
        }
        if let Some(endpoint) = &self.retrieve_endpoint {
            url::Url::parse(endpoint).map_err(|e| {
                ConfigError(format!("retrieve_endpoint {} is not a URL: {}", endpoint, e))
            })?;
        }
        if self.max_query_length == 0 {
            return Err(ConfigError("max_query_length must be > 0".to_string()));
        }
        if self.max_results == 0 {
            return Err(ConfigError("max_results must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_millis(self.extraction_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Expand ~ in index_path to the home directory
    pub fn expanded_index_path(&self) -> PathBuf {
        if let Some(rest) = self.index_path.strip_prefix("~/") {
            if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.index_path)
    }
}
