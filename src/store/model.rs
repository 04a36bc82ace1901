//! Endpoint group data model
//!
//! Mirrors the JSON the editor UI writes. Fields the model does not name are
//! kept in `extra` so a save never drops data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A named collection of documented endpoints, stored as one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointGroup {
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub method: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<HeaderField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<ParamField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseExample>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderField {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamField {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub required: bool,
    /// Whether the UI percent-encodes the value when building the query
    #[serde(default)]
    pub encode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseExample {
    /// `null` when the editor's status field was left blank
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub example: Value,
}

/// Derive an endpoint id from its method and path
///
/// Lowercased, every run of non-alphanumerics collapsed to one hyphen,
/// no leading or trailing hyphen.
///
/// ```
/// use apidocs::store::generate_id;
/// assert_eq!(generate_id("POST", "/users/:id"), "post-users-id");
/// ```
pub fn generate_id(method: &str, path: &str) -> String {
    let mut id = String::with_capacity(method.len() + path.len() + 1);
    let mut pending_hyphen = false;

    for c in format!("{method}-{path}").chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !id.is_empty() {
                id.push('-');
            }
            pending_hyphen = false;
            id.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    id
}

impl EndpointGroup {
    pub fn new(group: impl Into<String>, description: Option<String>) -> Self {
        Self {
            group: group.into(),
            description,
            endpoints: Vec::new(),
            extra: Map::new(),
        }
    }

    /// First endpoint id that appears more than once, if any
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.endpoints
            .iter()
            .map(|e| e.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

impl Endpoint {
    /// New endpoint with its id derived from method and path
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            id: generate_id(method, path),
            method: method.to_uppercase(),
            path: path.to_string(),
            summary: None,
            description: None,
            headers: None,
            params: None,
            body: None,
            response: None,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_id() {
        assert_eq!(generate_id("POST", "/users/:id"), "post-users-id");
        assert_eq!(generate_id("GET", "/"), "get");
        assert_eq!(generate_id("get", "//a__b--C//"), "get-a-b-c");
        assert_eq!(generate_id("", "/v1/items"), "v1-items");
        assert_eq!(generate_id("DELETE", "/사용자/{id}"), "delete-id");
    }

    #[test]
    fn test_duplicate_id() {
        let mut group = EndpointGroup::new("Users", None);
        group.endpoints.push(Endpoint::new("GET", "/users"));
        group.endpoints.push(Endpoint::new("POST", "/users"));
        assert_eq!(group.duplicate_id(), None);

        group.endpoints.push(Endpoint::new("get", "/users/"));
        assert_eq!(group.duplicate_id(), Some("get-users"));
    }

    #[test]
    fn test_blank_response_status_is_null() {
        let ep: Endpoint = serde_json::from_value(json!({
            "id": "get-a",
            "method": "GET",
            "path": "/a",
            "response": {"status": null, "example": null}
        }))
        .unwrap();
        assert_eq!(ep.response.and_then(|r| r.status), None);
    }

    #[test]
    fn test_unknown_fields_survive() {
        let raw = json!({
            "group": "Auth",
            "color": "blue",
            "endpoints": [{
                "id": "post-login",
                "method": "POST",
                "path": "/login",
                "deprecated": true,
                "params": [{"key": "q", "value": "", "required": false, "encode": true}],
                "response": {"status": 200, "example": {"token": "x"}}
            }]
        });
        let group: EndpointGroup = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(group.extra.get("color"), Some(&json!("blue")));
        assert_eq!(serde_json::to_value(&group).unwrap(), raw);
    }
}
