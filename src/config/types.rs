// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub store: StoreConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Stage name injected into synthesized events (e.g. "pro")
    #[serde(default)]
    pub stage: Option<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// combined, common, json, or a custom `$variable` pattern
    pub access_log_format: String,
    #[serde(default)]
    pub access_log_file: Option<String>,
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// HTTP front door configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
    /// Seconds before an idle connection is dropped
    pub read_timeout: u64,
}

/// Store tables and index names
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    pub spaces_table: String,
    pub users_table: String,
    pub owner_index: String,
    pub owner_index_enabled: bool,
    #[serde(default)]
    pub snapshot_file: Option<String>,
}
