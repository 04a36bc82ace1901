//! Proxy relay request/response contract

use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Outbound request description sent by the browser
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// String bodies are sent as-is, any other JSON value is serialized first
    #[serde(default)]
    pub body: Option<Value>,
}

/// Remote body, parsed as JSON when it parses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Raw(String),
}

impl ResponseBody {
    /// Decode as UTF-8 (lossy) and try JSON, whatever the content type says
    pub fn decode(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        match serde_json::from_str(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Raw(text.into_owned()),
        }
    }
}

/// One header name maps to a string, or to an array when it repeats
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeaderValues {
    One(String),
    Many(Vec<String>),
}

impl HeaderValues {
    fn push(&mut self, value: String) {
        match self {
            Self::One(first) => *self = Self::Many(vec![std::mem::take(first), value]),
            Self::Many(values) => values.push(value),
        }
    }
}

/// Collect response headers keeping arrival order for repeated names
pub fn collect_headers(headers: &hyper::HeaderMap) -> BTreeMap<String, HeaderValues> {
    let mut out: BTreeMap<String, HeaderValues> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match out.get_mut(name.as_str()) {
            Some(existing) => existing.push(value),
            None => {
                out.insert(name.as_str().to_string(), HeaderValues::One(value));
            }
        }
    }
    out
}

/// A completed relay
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: u16,
    pub headers: BTreeMap<String, HeaderValues>,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorKind {
    /// Bad input; no outbound attempt was made
    Validation,
    /// Connect, DNS, TLS or protocol failure
    Transport,
    /// The upstream timeout expired
    Timeout,
}

impl RelayErrorKind {
    /// Status code the front door answers with
    ///
    /// Relay-level failures still complete the `/proxy` call, so they are 200
    /// with the failure embedded in the payload.
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Transport | Self::Timeout => StatusCode::OK,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RelayError {
    pub kind: RelayErrorKind,
    pub message: String,
}

impl RelayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: RelayErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: RelayErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            kind: RelayErrorKind::Timeout,
            message: "Request timeout".to_string(),
        }
    }
}

/// Wire shape returned to the browser
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProxyResult {
    Success {
        status: u16,
        headers: BTreeMap<String, HeaderValues>,
        body: ResponseBody,
    },
    Failure {
        /// Always the literal `"error"`
        status: &'static str,
        error: String,
    },
}

impl From<RelayResponse> for ProxyResult {
    fn from(resp: RelayResponse) -> Self {
        Self::Success {
            status: resp.status,
            headers: resp.headers,
            body: resp.body,
        }
    }
}

impl From<RelayError> for ProxyResult {
    fn from(err: RelayError) -> Self {
        Self::Failure {
            status: "error",
            error: err.message,
        }
    }
}
