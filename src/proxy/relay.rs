//! Proxy relay
//!
//! Turns a `ProxyRequest` into exactly one outbound HTTP/1.1 exchange and
//! reports exactly one outcome. Validation happens up front and never
//! touches the network; everything after that runs under the upstream
//! timeout. There are no retries.

use std::time::{Duration, Instant};

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::client::conn::http1;
use hyper::header::{HeaderName, HeaderValue, CONTENT_LENGTH, HOST};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use url::Url;

use super::transport::{self, ConnectionGuard};
use super::types::{collect_headers, ProxyRequest, RelayError, RelayResponse, ResponseBody};
use crate::logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    Http,
    Https,
}

/// A validated request, ready to send
#[derive(Debug)]
pub struct PreparedRequest {
    scheme: Scheme,
    /// Host to connect to (no brackets for IPv6)
    host: String,
    port: u16,
    request: Request<Full<Bytes>>,
    /// Original target, kept for logging
    url: String,
}

#[cfg(test)]
impl PreparedRequest {
    const fn request(&self) -> &Request<Full<Bytes>> {
        &self.request
    }

    const fn port(&self) -> u16 {
        self.port
    }

    fn host(&self) -> &str {
        &self.host
    }
}

/// Server-side relay for browser-issued requests
pub struct ProxyRelay {
    timeout: Duration,
    tls: TlsConnector,
}

impl ProxyRelay {
    pub fn new(timeout: Duration) -> Result<Self, rustls::Error> {
        Ok(Self {
            timeout,
            tls: transport::build_tls_connector()?,
        })
    }

    /// Validate and send; every outcome is a value, never a panic or hang
    pub async fn relay(&self, req: ProxyRequest) -> Result<RelayResponse, RelayError> {
        let prepared = prepare(req)?;
        self.send(prepared).await
    }

    /// Perform the outbound call under the upstream timeout
    pub async fn send(&self, prepared: PreparedRequest) -> Result<RelayResponse, RelayError> {
        let started = Instant::now();
        let method = prepared.request.method().to_string();
        let url = prepared.url.clone();

        let result = match tokio::time::timeout(self.timeout, self.exchange(prepared)).await {
            Ok(result) => result,
            Err(_) => Err(RelayError::timeout()),
        };

        let outcome = match &result {
            Ok(resp) => resp.status.to_string(),
            Err(e) => format!("error: {}", e.message),
        };
        logger::log_proxy(&method, &url, &outcome, started.elapsed().as_millis());

        result
    }

    async fn exchange(&self, prepared: PreparedRequest) -> Result<RelayResponse, RelayError> {
        match prepared.scheme {
            Scheme::Http => {
                let stream = transport::connect_plain(&prepared.host, prepared.port).await?;
                send_over(stream, prepared.request).await
            }
            Scheme::Https => {
                let stream =
                    transport::connect_tls(&prepared.host, prepared.port, &self.tls).await?;
                send_over(stream, prepared.request).await
            }
        }
    }
}

/// Run one request on a fresh connection and buffer the whole response
async fn send_over<T>(io: T, request: Request<Full<Bytes>>) -> Result<RelayResponse, RelayError>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, conn) = http1::handshake(TokioIo::new(io))
        .await
        .map_err(|e| RelayError::transport(hyper_message(&e)))?;

    let _guard = ConnectionGuard::new(tokio::spawn(async move {
        if let Err(e) = conn.await {
            logger::log_warning(&format!("Upstream connection ended with error: {e}"));
        }
    }));

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| RelayError::transport(hyper_message(&e)))?;

    let status = response.status().as_u16();
    let headers = collect_headers(response.headers());
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| RelayError::transport(hyper_message(&e)))?
        .to_bytes();

    Ok(RelayResponse {
        status,
        headers,
        body: ResponseBody::decode(&body),
    })
}

/// hyper's Display is terse; append the underlying cause when there is one
fn hyper_message(e: &hyper::Error) -> String {
    match std::error::Error::source(e) {
        Some(cause) => format!("{e}: {cause}"),
        None => e.to_string(),
    }
}

/// Validate a `ProxyRequest` and build the outbound request
///
/// `Host` always comes from the target URL and `Content-Length` always
/// matches the encoded body; caller values for both are dropped.
pub fn prepare(req: ProxyRequest) -> Result<PreparedRequest, RelayError> {
    let raw_url = req
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| RelayError::validation("url is required"))?;

    let url = Url::parse(raw_url).map_err(|_| RelayError::validation("Invalid target URL"))?;
    let scheme = match url.scheme() {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        other => {
            return Err(RelayError::validation(format!(
                "Unsupported protocol '{other}': only http and https can be proxied"
            )))
        }
    };
    let host = match url.host() {
        Some(url::Host::Domain(d)) => d.to_string(),
        Some(url::Host::Ipv4(ip)) => ip.to_string(),
        Some(url::Host::Ipv6(ip)) => ip.to_string(),
        None => return Err(RelayError::validation("Invalid target URL")),
    };
    let port = url
        .port_or_known_default()
        .unwrap_or(if scheme == Scheme::Https { 443 } else { 80 });

    // host_str keeps IPv6 brackets; port() is None when it is the scheme default
    let host_header = match (url.host_str(), url.port()) {
        (Some(h), Some(p)) => format!("{h}:{p}"),
        (Some(h), None) => h.to_string(),
        (None, _) => return Err(RelayError::validation("Invalid target URL")),
    };

    let method_str = req
        .method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("GET")
        .to_uppercase();
    let method = Method::from_bytes(method_str.as_bytes())
        .map_err(|_| RelayError::validation(format!("Invalid HTTP method: {method_str}")))?;

    let path_and_query = match url.query() {
        Some(q) => format!("{}?{q}", url.path()),
        None => url.path().to_string(),
    };

    let body = encode_body(req.body)?;

    let mut builder = Request::builder().method(method).uri(path_and_query);
    if let Some(headers) = builder.headers_mut() {
        for (key, value) in req.headers.unwrap_or_default() {
            let name = HeaderName::from_bytes(key.trim().as_bytes())
                .map_err(|_| RelayError::validation(format!("Invalid header name: {key}")))?;
            if name == HOST || name == CONTENT_LENGTH {
                continue;
            }
            let value = HeaderValue::from_str(&value)
                .map_err(|_| RelayError::validation(format!("Invalid value for header {key}")))?;
            headers.append(name, value);
        }

        let host_value = HeaderValue::from_str(&host_header)
            .map_err(|_| RelayError::validation("Invalid target URL"))?;
        headers.insert(HOST, host_value);
        if let Some(ref bytes) = body {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
        }
    }

    let request = builder
        .body(Full::new(body.unwrap_or_default()))
        .map_err(|e| RelayError::validation(format!("Invalid request: {e}")))?;

    Ok(PreparedRequest {
        scheme,
        host,
        port,
        request,
        url: url.to_string(),
    })
}

/// Strings go out as UTF-8 bytes, other JSON values are serialized first
fn encode_body(body: Option<Value>) -> Result<Option<Bytes>, RelayError> {
    match body {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(Bytes::from(s))),
        Some(other) => serde_json::to_vec(&other)
            .map(|v| Some(Bytes::from(v)))
            .map_err(|e| RelayError::validation(format!("Invalid body: {e}"))),
    }
}
