// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::handle_connection;
use crate::config::AppState;
use crate::logger;

/// Run the accept loop on `listener` until `shutdown` completes.
///
/// Connections already accepted keep running in their own tasks; only the
/// listener is closed on shutdown.
pub async fn start_server_loop<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = &'static str>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        handle_connection(stream, peer_addr, Arc::clone(&state));
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            reason = &mut shutdown => {
                logger::log_shutdown(reason);
                break;
            }
        }
    }
}
