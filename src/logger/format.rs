//! Access log format module
//!
//! Supports:
//! - `common` (Common Log Format - CLF)
//! - `json` (one JSON object per line)

use chrono::Local;

/// Access log entry containing all request/response information
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Request timestamp
    pub time: chrono::DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    pub status: u16,
    /// Response body size in bytes
    pub body_bytes: u64,
    /// Request processing time in microseconds
    pub request_time_us: u64,
}

impl AccessLogEntry {
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            status: 200,
            body_bytes: 0,
            request_time_us: 0,
        }
    }

    /// Format the entry; unknown format names fall back to `common`
    pub fn format(&self, format: &str) -> String {
        match format {
            "json" => self.format_json(),
            _ => self.format_common(),
        }
    }

    fn request_target(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent $request_time`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {}\" {} {} {}us",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.request_target(),
            self.status,
            self.body_bytes,
            self.request_time_us,
        )
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "time": self.time.to_rfc3339(),
            "remote_addr": self.remote_addr,
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> AccessLogEntry {
        let mut e = AccessLogEntry::new(
            "127.0.0.1".to_string(),
            "POST".to_string(),
            "/proxy".to_string(),
        );
        e.query = Some("v=1".to_string());
        e.status = 200;
        e.body_bytes = 42;
        e.request_time_us = 1500;
        e
    }

    #[test]
    fn test_common_format() {
        let line = entry().format("common");
        assert!(line.starts_with("127.0.0.1 - - ["));
        assert!(line.ends_with("\"POST /proxy?v=1\" 200 42 1500us"));
    }

    #[test]
    fn test_json_format() {
        let value: serde_json::Value = serde_json::from_str(&entry().format("json")).unwrap();
        assert_eq!(value["method"], "POST");
        assert_eq!(value["status"], 200);
        assert_eq!(value["query"], "v=1");
    }

    #[test]
    fn test_unknown_format_falls_back() {
        assert_eq!(entry().format("combined"), entry().format("common"));
    }
}
