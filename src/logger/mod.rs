//! Logger module
//!
//! Thin facade over `tracing` so call sites stay short:
//! - Server lifecycle logging
//! - Access logging (common or json)
//! - Error and warning logging

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber
///
/// `RUST_LOG` wins over `logging.level` when set.
pub fn init(config: &Config) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    info!("======================================");
    info!("Local API Docs server started");
    info!("Listening on: http://{addr}");
    info!("Document root: {}", config.paths.static_root);
    info!("API files: {}", config.paths.apis_dir);
    if let Some(ref target) = config.server.default_target {
        info!("Default target host: {target}");
    }
    if let Some(workers) = config.server.workers {
        info!("Worker threads: {workers}");
    }
    info!("Proxy timeout: {}s", config.proxy.timeout_secs);
    info!("======================================");
}

pub fn log_bind_failed(addr: &SocketAddr, err: &std::io::Error, env_file: &str) {
    if err.kind() == std::io::ErrorKind::AddrInUse {
        error!("Port {} is already in use.", addr.port());
        error!("Change PORT in {env_file} or stop the process holding the port.");
    } else {
        error!("Failed to bind {addr}: {err}");
    }
}

pub fn log_shutdown(reason: &str) {
    info!("Shutting down ({reason})");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    error!("Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    error!("{message}");
}

pub fn log_warning(message: &str) {
    warn!("{message}");
}

/// Log one relay attempt and how it ended
pub fn log_proxy(method: &str, url: &str, outcome: &str, elapsed_ms: u128) {
    info!(target: "proxy", "{method} {url} -> {outcome} ({elapsed_ms}ms)");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    info!(target: "access", "{}", entry.format(format));
}
