//! Env file module
//!
//! Reads the `KEY=value` file the UI shares with the server (`local.env`).
//! Blank lines, `#` comments and lines without `=` are ignored. Common
//! request headers are stored as `HEADER_<n>=<name>: <value>` lines.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const HEADER_KEY_PREFIX: &str = "HEADER_";

/// A request header shared by every endpoint in the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonHeader {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Error, Debug)]
pub enum EnvFileError {
    #[error("Header name must not be empty")]
    EmptyHeaderName,

    #[error("Header '{0}' contains a line break")]
    MultilineHeader(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parsed env file, keys kept in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    entries: Vec<(String, String)>,
}

impl EnvFile {
    pub fn parse(content: &str) -> Self {
        let entries = content.lines().filter_map(parse_line).collect();
        Self { entries }
    }

    /// Load from disk; a missing or unreadable file is empty
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path).map_or_else(|_| Self::default(), |c| Self::parse(&c))
    }

    /// Last value wins when a key repeats
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn port(&self) -> Option<u16> {
        self.get("PORT").and_then(|p| p.parse().ok())
    }

    /// Default target host with any trailing slash removed
    pub fn host(&self) -> Option<String> {
        self.get("HOST")
            .map(|h| h.trim_end_matches('/').to_string())
            .filter(|h| !h.is_empty())
    }

    pub fn common_headers(&self) -> Vec<CommonHeader> {
        let mut numbered: Vec<(u32, CommonHeader)> = self
            .entries
            .iter()
            .filter_map(|(k, v)| {
                let n = k.strip_prefix(HEADER_KEY_PREFIX)?.parse::<u32>().ok()?;
                let (name, value) = v.split_once(':')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                Some((
                    n,
                    CommonHeader {
                        key: name.to_string(),
                        value: value.trim().to_string(),
                    },
                ))
            })
            .collect();
        numbered.sort_by_key(|(n, _)| *n);
        numbered.into_iter().map(|(_, h)| h).collect()
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

fn is_header_line(line: &str) -> bool {
    parse_line(line).is_some_and(|(k, _)| k.starts_with(HEADER_KEY_PREFIX))
}

/// Replace the `HEADER_<n>` lines of `content`, keeping every other line as written
pub fn render_with_headers(
    content: &str,
    headers: &[CommonHeader],
) -> Result<String, EnvFileError> {
    let mut lines: Vec<String> = content
        .lines()
        .filter(|l| !is_header_line(l))
        .map(ToString::to_string)
        .collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    let mut n = 0;
    for header in headers {
        let name = header.key.trim();
        if name.is_empty() {
            return Err(EnvFileError::EmptyHeaderName);
        }
        if name.contains(['\n', '\r']) || header.value.contains(['\n', '\r']) {
            return Err(EnvFileError::MultilineHeader(name.to_string()));
        }
        n += 1;
        lines.push(format!("{HEADER_KEY_PREFIX}{n}={name}: {}", header.value));
    }

    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}

/// Persist common headers to the env file, creating it when missing
pub async fn save_common_headers(
    path: &Path,
    headers: &[CommonHeader],
) -> Result<(), EnvFileError> {
    let current = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let updated = render_with_headers(&current, headers)?;
    tokio::fs::write(path, updated).await?;
    Ok(())
}
