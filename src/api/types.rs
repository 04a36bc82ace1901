// Request/response payloads of the JSON endpoints

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CommonHeader;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveApiRequest {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateIndexRequest {
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveConfigRequest {
    #[serde(default)]
    pub headers: Vec<CommonHeader>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub port: u16,
}

#[derive(Debug, Serialize)]
pub struct SaveApiResponse {
    pub ok: bool,
    pub file: String,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub ok: bool,
    pub index: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub port: u16,
    pub host: Option<String>,
    pub headers: Vec<CommonHeader>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}
