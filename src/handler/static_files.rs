//! Static file serving module
//!
//! Maps request paths onto the document root. Resolution is lexical first
//! (so `..` can never climb above the root, encoded or not) and then checked
//! again on the canonical path so a symlink cannot lead outside either.

use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Outcome of mapping a request path onto the root
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved {
    /// Candidate file inside the root (may not exist)
    Inside(PathBuf),
    /// The path would leave the root
    Escapes,
}

/// Percent-decode `request_path` and resolve it under `root`
///
/// `/` maps to `default_document`. Both `/` and `\` separate segments.
pub fn resolve_path(root: &Path, request_path: &str, default_document: &str) -> Resolved {
    let decoded = urlencoding::decode(request_path)
        .map_or_else(|_| request_path.to_string(), std::borrow::Cow::into_owned);

    let relative = if decoded == "/" || decoded.is_empty() {
        default_document.to_string()
    } else {
        decoded
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in relative.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Resolved::Escapes;
                }
            }
            s if s.contains('\0') => return Resolved::Escapes,
            s => segments.push(s),
        }
    }

    let mut path = root.to_path_buf();
    path.extend(segments);
    Resolved::Inside(path)
}

/// Serve one file from the document root
pub async fn serve_static(
    root: &str,
    request_path: &str,
    default_document: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let root = match std::path::absolute(root) {
        Ok(p) => p,
        Err(e) => {
            logger::log_error(&format!("Document root '{root}' is unusable: {e}"));
            return http::build_404_response();
        }
    };

    let mut file_path = match resolve_path(&root, request_path, default_document) {
        Resolved::Inside(p) => p,
        Resolved::Escapes => {
            logger::log_warning(&format!("Path traversal attempt blocked: {request_path}"));
            return http::build_403_response();
        }
    };

    if fs::metadata(&file_path).await.is_ok_and(|m| m.is_dir()) {
        file_path.push(default_document);
    }

    // File not found is common (404), no need to log at warning level
    let Ok(canonical) = fs::canonicalize(&file_path).await else {
        return http::build_404_response();
    };
    let root_canonical = fs::canonicalize(&root).await.unwrap_or(root);
    if !canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Blocked request leaving the document root: {request_path}"
        ));
        return http::build_403_response();
    }

    match fs::read(&canonical).await {
        Ok(content) => {
            let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
            http::build_file_response(content, content_type, is_head)
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read '{}': {e}", canonical.display()));
            http::build_404_response()
        }
    }
}
