// Application state module
// Shared by every connection: configuration plus the store and relay

use std::path::PathBuf;
use tokio::sync::Mutex;

use super::types::Config;
use crate::proxy::ProxyRelay;
use crate::store::EndpointStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: EndpointStore,
    pub relay: ProxyRelay,
    /// Serializes rewrites of the env file
    pub env_file_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, rustls::Error> {
        let apis_dir = PathBuf::from(&config.paths.apis_dir);
        Ok(Self {
            config: config.clone(),
            store: EndpointStore::new(apis_dir, config.paths.index_file.clone()),
            relay: ProxyRelay::new(config.proxy_timeout())?,
            env_file_lock: Mutex::new(()),
        })
    }
}
