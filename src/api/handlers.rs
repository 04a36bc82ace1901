// JSON endpoint handlers
// health, proxy relay, endpoint-group saving, index and common-header config

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::response::{bad_request, error_response, internal_error, json_response, payload_too_large};
use super::types::{
    ConfigResponse, HealthResponse, IndexResponse, OkResponse, SaveApiRequest, SaveApiResponse,
    SaveConfigRequest, UpdateIndexRequest,
};
use crate::config::env_file::{self, EnvFileError};
use crate::config::{AppState, EnvFile};
use crate::logger;
use crate::proxy::{ProxyRequest, ProxyResult};

/// Read the whole body (bounded by `max_body_size`) and decode it as JSON
async fn read_json<T, B>(req: Request<B>, limit: u64) -> Result<T, Response<Full<Bytes>>>
where
    T: DeserializeOwned,
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit_usize = usize::try_from(limit).unwrap_or(usize::MAX);
    let bytes = match Limited::new(req.into_body(), limit_usize).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(payload_too_large(limit));
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return Err(bad_request("Failed to read request body"));
        }
    };

    serde_json::from_slice(&bytes).map_err(|e| bad_request(&format!("Invalid JSON payload: {e}")))
}

/// GET /health
pub fn handle_health(state: &AppState) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "ok",
            port: state.config.server.port,
        },
    )
}

/// POST /proxy
///
/// Relay failures still answer with the status their kind maps to, carrying
/// `{status:"error", error}`.
pub async fn handle_proxy<B>(req: Request<B>, state: Arc<AppState>) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let proxy_req: ProxyRequest = match read_json(req, state.config.http.max_body_size).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match state.relay.relay(proxy_req).await {
        Ok(resp) => json_response(StatusCode::OK, &ProxyResult::from(resp)),
        Err(err) => {
            let status = err.kind.http_status();
            json_response(status, &ProxyResult::from(err))
        }
    }
}

/// POST /save-api
pub async fn handle_save_api<B>(req: Request<B>, state: Arc<AppState>) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let payload: SaveApiRequest = match read_json(req, state.config.http.max_body_size).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let (Some(file_name), Some(data)) = (
        payload.file_name.filter(|f| !f.is_empty()),
        payload.data.filter(|d| !d.is_null()),
    ) else {
        return bad_request("fileName and data required");
    };
    if !data.is_object() {
        return bad_request("data must be an endpoint group object");
    }

    // The raw value is written so fields the model does not know survive
    match state.store.write_group(&file_name, &data).await {
        Ok(file) => json_response(StatusCode::OK, &SaveApiResponse { ok: true, file }),
        Err(e) if e.is_client_error() => bad_request(&e.to_string()),
        Err(e) => {
            logger::log_error(&e.to_string());
            internal_error(&e.to_string())
        }
    }
}

/// POST /update-index
pub async fn handle_update_index<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let payload: UpdateIndexRequest = match read_json(req, state.config.http.max_body_size).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let Some(file) = payload.file.filter(|f| !f.is_empty()) else {
        return bad_request("file is required");
    };

    match state.store.append_index(&file).await {
        Ok(index) => json_response(StatusCode::OK, &IndexResponse { ok: true, index }),
        Err(e) if e.is_client_error() => bad_request(&e.to_string()),
        Err(e) => {
            logger::log_error(&e.to_string());
            internal_error(&e.to_string())
        }
    }
}

/// GET /get-config
pub async fn handle_get_config(state: &AppState) -> Response<Full<Bytes>> {
    let env = match tokio::fs::read_to_string(state.config.env_file_path()).await {
        Ok(content) => EnvFile::parse(&content),
        Err(_) => EnvFile::default(),
    };

    json_response(
        StatusCode::OK,
        &ConfigResponse {
            port: state.config.server.port,
            host: env.host().or_else(|| state.config.server.default_target.clone()),
            headers: env.common_headers(),
        },
    )
}

/// POST /save-config
pub async fn handle_save_config<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let payload: SaveConfigRequest = match read_json(req, state.config.http.max_body_size).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let _guard = state.env_file_lock.lock().await;
    match env_file::save_common_headers(&state.config.env_file_path(), &payload.headers).await {
        Ok(()) => json_response(StatusCode::OK, &OkResponse { ok: true }),
        Err(e @ EnvFileError::Io(_)) => {
            logger::log_error(&format!("Failed to save common headers: {e}"));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
        Err(e) => bad_request(&e.to_string()),
    }
}
