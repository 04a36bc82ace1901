// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub proxy: ProxyConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Default target host for the UI, taken from `HOST` in the env file
    #[serde(default)]
    pub default_target: Option<String>,
}

/// Filesystem layout
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PathsConfig {
    /// Document root for static files
    pub static_root: String,
    /// Document served for `/`
    pub default_document: String,
    /// Directory holding endpoint-group files
    pub apis_dir: String,
    /// Index file name inside `apis_dir`
    pub index_file: String,
    /// `KEY=value` file holding PORT, HOST and common headers
    pub env_file: String,
}

/// Proxy relay configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProxyConfig {
    /// Upstream timeout covering connect, send and full body read
    pub timeout_secs: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "common".to_string()
}
