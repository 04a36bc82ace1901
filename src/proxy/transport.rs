//! Outbound connections for the relay
//!
//! One fresh TCP (or TLS over TCP) connection per call; nothing is pooled.

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use super::types::RelayError;

/// Build the shared TLS connector with the webpki root store
///
/// The ring provider is named explicitly so a second provider elsewhere in
/// the dependency tree cannot make the choice ambiguous.
pub fn build_tls_connector() -> Result<TlsConnector, rustls::Error> {
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config =
        rustls::ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(root_store)
            .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(tls_config)))
}

pub async fn connect_plain(host: &str, port: u16) -> Result<TcpStream, RelayError> {
    TcpStream::connect((host, port))
        .await
        .map_err(|e| RelayError::transport(e.to_string()))
}

pub async fn connect_tls(
    host: &str,
    port: u16,
    connector: &TlsConnector,
) -> Result<TlsStream<TcpStream>, RelayError> {
    let tcp = connect_plain(host, port).await?;

    let server_name = rustls::pki_types::ServerName::try_from(host.to_string())
        .map_err(|_| RelayError::transport(format!("Invalid server name for TLS: {host}")))?;

    connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| RelayError::transport(format!("TLS handshake failed: {e}")))
}

/// Aborts the connection driver task when the relay finishes or is dropped
pub struct ConnectionGuard(tokio::task::JoinHandle<()>);

impl ConnectionGuard {
    pub const fn new(handle: tokio::task::JoinHandle<()>) -> Self {
        Self(handle)
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_connector_builds() {
        assert!(build_tls_connector().is_ok());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port that nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect_plain("127.0.0.1", port).await.unwrap_err();
        assert_eq!(err.kind, super::super::types::RelayErrorKind::Transport);
        assert!(!err.message.is_empty());
    }
}
