// Configuration module entry point
// Layers defaults, an optional config file, APIDOCS_* environment variables
// and the shared env file into one Config

pub mod env_file;
mod state;
mod types;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::builder::DefaultState;
use config::ConfigBuilder;

// Re-export public types
pub use env_file::{CommonHeader, EnvFile};
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PathsConfig, ProxyConfig, ServerConfig};

impl Config {
    /// Load configuration using the first CLI argument as the config file path
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// `PORT` and `HOST` from the env file override whatever the other layers set.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let base = base_builder(config_path)?.build()?;
        let env_path = base.get_string("paths.env_file")?;
        let env = EnvFile::load(Path::new(&env_path));

        let settings = base_builder(config_path)?
            .set_override_option("server.port", env.port().map(i64::from))?
            .set_override_option("server.default_target", env.host())?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy.timeout_secs)
    }

    pub fn env_file_path(&self) -> PathBuf {
        PathBuf::from(&self.paths.env_file)
    }
}

fn base_builder(config_path: &str) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name(config_path).required(false))
        .add_source(config::Environment::with_prefix("APIDOCS").separator("__"))
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("paths.static_root", ".")?
        .set_default("paths.default_document", "index.html")?
        .set_default("paths.apis_dir", "apis")?
        .set_default("paths.index_file", "index.json")?
        .set_default("paths.env_file", "local.env")?
        .set_default("proxy.timeout_secs", 30)?
        .set_default("http.max_body_size", 10_485_760)? // 10MB
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "common")
}
