//! HTTP response building module
//!
//! Builders for the fixed status responses plus the CORS header set shared
//! by JSON responses and preflight.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::Response;

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET,POST,PUT,PATCH,DELETE,OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "*";

/// Attach the CORS header set to a response builder
pub fn with_cors(builder: Builder) -> Builder {
    builder
        .header("Access-Control-Allow-Origin", CORS_ALLOW_ORIGIN)
        .header("Access-Control-Allow-Methods", CORS_ALLOW_METHODS)
        .header("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS)
}

/// Build OPTIONS response (preflight request): 204, CORS headers only
pub fn build_options_response() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(204))
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 403 Forbidden response; never says which path was refused
pub fn build_403_response() -> Response<Full<Bytes>> {
    plain_response(403, "Forbidden")
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    plain_response(404, "Not Found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, POST, OPTIONS")
        .body(Full::new(Bytes::from("Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("Method Not Allowed")))
        })
}

/// Build static file response: 200 with `no-cache` so edits show up immediately
pub fn build_file_response(data: Vec<u8>, content_type: &str, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { Bytes::from(data) };

    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Cache-Control", "no-cache")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

fn plain_response(status: u16, text: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(text)))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::from(text)))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_has_cors_only() {
        let resp = build_options_response();
        assert_eq!(resp.status(), 204);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            resp.headers()["access-control-allow-methods"],
            CORS_ALLOW_METHODS
        );
        assert_eq!(resp.headers()["access-control-allow-headers"], "*");
        assert!(resp.headers().get("content-type").is_none());
    }

    #[test]
    fn test_file_response_head_has_length_but_no_body() {
        let resp = build_file_response(b"hello".to_vec(), "text/plain", true);
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-length"], "5");
        assert_eq!(resp.headers()["cache-control"], "no-cache");
        assert_eq!(hyper::body::Body::size_hint(resp.body()).exact(), Some(0));
    }
}
