//! Server configuration.
//!
//! Loaded from a YAML file or environment variables; every key falls back
//! to a sensible default.

use serde::{Deserialize, Serialize};

/// Server configuration.
///
/// Example YAML:
/// ```yaml
/// main:
///   log_level: "info"
/// server:
///   port: 50051
///   threads: 4
///   db_worker_pool_size: 10
///   log_level: "info"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Process-wide settings
    #[serde(default)]
    pub main: MainConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConfig {
    /// Log level for the process (trace/debug/info/warn/error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Listen port for the RPC front end
    #[serde(default = "default_port")]
    pub port: u16,

    /// RPC queue poller threads
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Database worker pool size
    #[serde(default = "default_db_worker_pool_size")]
    pub db_worker_pool_size: usize,

    /// Log level override for the server component
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            threads: default_threads(),
            db_worker_pool_size: default_db_worker_pool_size(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    50051
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_db_worker_pool_size() -> usize {
    10
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("failed to read config file: {}", e)))?;

        let config: ServerConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("failed to parse YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Supported variables: `KOMBUDB_LOG_LEVEL`, `KOMBUDB_PORT`,
    /// `KOMBUDB_THREADS`, `KOMBUDB_DB_WORKER_POOL_SIZE`. Anything unset
    /// keeps its default.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let mut config = ServerConfig::default();

        if let Ok(level) = std::env::var("KOMBUDB_LOG_LEVEL") {
            config.main.log_level = level.clone();
            config.server.log_level = level;
        }
        if let Ok(port) = std::env::var("KOMBUDB_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidField(format!("invalid port: {}", port)))?;
        }
        if let Ok(threads) = std::env::var("KOMBUDB_THREADS") {
            config.server.threads = threads
                .parse()
                .map_err(|_| ConfigError::InvalidField(format!("invalid threads: {}", threads)))?;
        }
        if let Ok(size) = std::env::var("KOMBUDB_DB_WORKER_POOL_SIZE") {
            config.server.db_worker_pool_size = size.parse().map_err(|_| {
                ConfigError::InvalidField(format!("invalid db_worker_pool_size: {}", size))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidField("port must be > 0".to_string()));
        }
        if self.server.threads == 0 {
            return Err(ConfigError::InvalidField("threads must be > 0".to_string()));
        }
        if self.server.db_worker_pool_size == 0 {
            return Err(ConfigError::InvalidField(
                "db_worker_pool_size must be > 0".to_string(),
            ));
        }
        for level in [&self.main.log_level, &self.server.log_level] {
            if !matches!(
                level.as_str(),
                "trace" | "debug" | "info" | "warn" | "error"
            ) {
                return Err(ConfigError::InvalidField(format!(
                    "unknown log level: {}",
                    level
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid field: {0}")]
    InvalidField(String),
}
