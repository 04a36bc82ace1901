// Server module entry
// Listener setup, the accept loop and per-connection serving

pub mod connection;
pub mod listener;
pub mod signal;

// Rust does not allow `loop` as a module name, so it is mounted as server_loop
#[path = "loop.rs"]
pub mod server_loop;

use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::AppState;

pub use listener::create_listener;
pub use server_loop::start_server_loop;
pub use signal::shutdown_signal;

/// Serve on `listener` until SIGINT or SIGTERM arrives
pub async fn serve(listener: TcpListener, state: Arc<AppState>) {
    start_server_loop(listener, state, shutdown_signal()).await;
}
