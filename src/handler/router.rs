//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Dispatch is an exact match on
//! method and path; anything unmatched falls through to static files.

use crate::api;
use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let access_log = state.config.logging.access_log.then(|| {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            req.method().to_string(),
            req.uri().path().to_string(),
        );
        entry.query = req.uri().query().map(ToString::to_string);
        entry
    });

    let response = route_request(req, &state).await;

    if let Some(mut entry) = access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on method and path
pub async fn route_request<B>(req: Request<B>, state: &Arc<AppState>) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    // CORS preflight on any path
    if req.method() == Method::OPTIONS {
        return http::build_options_response();
    }

    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return resp;
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (&method, path.as_str()) {
        (_, "/health") => api::handle_health(state),
        (&Method::POST, "/proxy") => api::handle_proxy(req, Arc::clone(state)).await,
        (&Method::POST, "/save-api") => api::handle_save_api(req, Arc::clone(state)).await,
        (&Method::POST, "/update-index") => {
            api::handle_update_index(req, Arc::clone(state)).await
        }
        (&Method::GET, "/get-config") => api::handle_get_config(state).await,
        (&Method::POST, "/save-config") => api::handle_save_config(req, Arc::clone(state)).await,
        (&Method::GET | &Method::HEAD, _) => {
            let paths = &state.config.paths;
            static_files::serve_static(
                &paths.static_root,
                &path,
                &paths.default_document,
                method == Method::HEAD,
            )
            .await
        }
        _ => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            http::build_405_response()
        }
    }
}

/// Reject a declared Content-Length over the limit before reading anything
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let declared = req
        .headers()
        .get("content-length")?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()?;
    if declared > max_body_size {
        logger::log_warning(&format!(
            "Request body too large: {declared} bytes (max: {max_body_size})"
        ));
        return Some(api::payload_too_large(max_body_size));
    }
    None
}
