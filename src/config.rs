//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::backend::{ElasticConfig, RefreshPolicy};
use crate::discovery::{DEFAULT_MAX_RESULTS, DEFAULT_READ_INDEX, DEFAULT_WRITE_INDEX};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backing store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ElasticsearchConfig {
    #[serde(default = "default_es_url")]
    pub url: String,

    /// Index (or alias) searches start on
    #[serde(default = "default_read_index")]
    pub read_index: String,

    /// Index (or alias) writes start on
    #[serde(default = "default_write_index")]
    pub write_index: String,

    #[serde(default = "default_es_timeout")]
    pub request_timeout_ms: u64,

    /// Hits returned by a single query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default)]
    pub refresh: RefreshPolicy,

    pub username: Option<String>,

    pub password: Option<String>,
}

fn default_es_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_read_index() -> String {
    DEFAULT_READ_INDEX.to_string()
}

fn default_write_index() -> String {
    DEFAULT_WRITE_INDEX.to_string()
}

fn default_es_timeout() -> u64 {
    5000 // 5 seconds
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_es_url(),
            read_index: default_read_index(),
            write_index: default_write_index(),
            request_timeout_ms: default_es_timeout(),
            max_results: default_max_results(),
            refresh: RefreshPolicy::default(),
            username: None,
            password: None,
        }
    }
}

impl ElasticsearchConfig {
    /// Connection settings for the HTTP client
    pub fn client_config(&self) -> ElasticConfig {
        ElasticConfig {
            base_url: self.url.clone(),
            request_timeout_ms: self.request_timeout_ms,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8086
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("metric-discovery").join("config.toml")),
            Some(PathBuf::from("/etc/metric-discovery/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Elasticsearch overrides
        if let Some(url) = var("DISCOVERY_ES_URL") {
            self.elasticsearch.url = url;
        }
        if let Some(index) = var("DISCOVERY_READ_INDEX") {
            self.elasticsearch.read_index = index;
        }
        if let Some(index) = var("DISCOVERY_WRITE_INDEX") {
            self.elasticsearch.write_index = index;
        }
        if let Some(max) = var("DISCOVERY_MAX_RESULTS") {
            if let Ok(m) = max.parse() {
                self.elasticsearch.max_results = m;
            }
        }

        // API overrides
        if let Some(host) = var("DISCOVERY_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("DISCOVERY_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = var("DISCOVERY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("DISCOVERY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Metric Discovery Configuration
#
# Environment variables override these settings:
# - DISCOVERY_ES_URL
# - DISCOVERY_READ_INDEX
# - DISCOVERY_WRITE_INDEX
# - DISCOVERY_MAX_RESULTS
# - DISCOVERY_API_HOST
# - DISCOVERY_API_PORT
# - DISCOVERY_LOG_LEVEL
# - DISCOVERY_LOG_FORMAT

[elasticsearch]
# Elasticsearch base URL
url = "http://localhost:9200"

# Index or alias searched for metric names
read_index = "metric_metadata_read"

# Index or alias new metric names are written to
write_index = "metric_metadata_write"

# Per-request timeout (ms)
request_timeout_ms = 5000

# Maximum hits returned by a single query
max_results = 500

# When writes become searchable: none, wait_for or immediate
refresh = "none"

# Optional basic auth
# username = "elastic"
# password = "changeme"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8086

# Request timeout in seconds
request_timeout_secs = 30

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/metric-discovery/discovery.log"
"#
    .to_string()
}
