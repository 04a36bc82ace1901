// End-to-end checks against a real listener: the front door, the JSON
// endpoints and the relay talking to a local upstream.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use apidocs::config::{
    AppState, Config, HttpConfig, LoggingConfig, PathsConfig, ProxyConfig, ServerConfig,
};
use apidocs::server;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};

fn test_config(root: &Path) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            workers: None,
            default_target: None,
        },
        paths: PathsConfig {
            static_root: root.display().to_string(),
            default_document: "index.html".to_string(),
            apis_dir: root.join("apis").display().to_string(),
            index_file: "index.json".to_string(),
            env_file: root.join("local.env").display().to_string(),
        },
        proxy: ProxyConfig { timeout_secs: 5 },
        http: HttpConfig {
            max_body_size: 1024 * 1024,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            access_log: true,
            access_log_format: "common".to_string(),
        },
    }
}

/// Start the docs server on an ephemeral port
async fn start_server(root: &Path) -> SocketAddr {
    std::fs::write(root.join("index.html"), "<h1>docs</h1>").unwrap();
    std::fs::write(root.join("local.env"), "PORT=3000\nHOST=http://localhost:8080\n").unwrap();

    let state = Arc::new(AppState::new(&test_config(root)).unwrap());
    let listener = server::create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::start_server_loop(
        listener,
        state,
        std::future::pending::<&'static str>(),
    ));
    addr
}

/// Upstream that answers every request with `{"pong":true}`
async fn start_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let service = service_fn(|_req| async {
                    Ok::<_, Infallible>(
                        Response::builder()
                            .header("content-type", "application/json")
                            .header("x-upstream", "mock")
                            .body(Full::new(Bytes::from_static(b"{\"pong\":true}")))
                            .unwrap(),
                    )
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
    addr
}

async fn send(
    addr: SocketAddr,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Bytes) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(conn);

    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("host", addr.to_string());
    let payload = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Bytes::from(v.to_string())
        }
        None => Bytes::new(),
    };
    let resp = sender
        .send_request(builder.body(Full::new(payload)).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes)
}

fn as_json(bytes: &Bytes) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_port_with_cors() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;

    let (status, headers, body) = send(addr, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"status": "ok", "port": 3000}));
    assert_eq!(headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_preflight_on_any_path_is_204() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;

    for path in ["/proxy", "/does/not/exist"] {
        let (status, headers, body) = send(addr, Method::OPTIONS, path, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT, "{path}");
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert!(body.is_empty());
    }
}

#[tokio::test]
async fn test_proxy_relays_upstream_response() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;
    let upstream = start_upstream().await;

    let (status, _, body) = send(
        addr,
        Method::POST,
        "/proxy",
        Some(json!({
            "method": "POST",
            "url": format!("http://{upstream}/ping"),
            "headers": {"X-Trace": "1"},
            "body": {"hello": "world"}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let result = as_json(&body);
    assert_eq!(result["status"], 200);
    assert_eq!(result["body"], json!({"pong": true}));
    assert_eq!(result["headers"]["x-upstream"], "mock");
}

#[tokio::test]
async fn test_proxy_missing_url_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;

    let (status, _, body) = send(addr, Method::POST, "/proxy", Some(json!({"method": "GET"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body)["status"], "error");
}

#[tokio::test]
async fn test_proxy_unreachable_upstream_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;

    // Grab a free port, then release it so nothing is listening there
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();

    let (status, _, body) = send(
        addr,
        Method::POST,
        "/proxy",
        Some(json!({"url": format!("http://{closed}/")})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let result = as_json(&body);
    assert_eq!(result["status"], "error");
    assert!(result["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_save_api_then_read_back_and_index_once() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;

    let group = json!({"group": "Auth", "endpoints": [], "owner": "team-a"});
    let (status, _, body) = send(
        addr,
        Method::POST,
        "/save-api",
        Some(json!({"fileName": "auth.json", "data": group})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"ok": true, "file": "auth.json"}));

    let (status, headers, body) = send(addr, Method::GET, "/apis/auth.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    assert_eq!(as_json(&body), group);

    for _ in 0..2 {
        let (status, _, body) = send(
            addr,
            Method::POST,
            "/update-index",
            Some(json!({"file": "auth.json"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(as_json(&body), json!({"ok": true, "index": ["auth.json"]}));
    }
}

#[tokio::test]
async fn test_save_api_requires_file_name_and_data() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;

    let (status, _, body) = send(
        addr,
        Method::POST,
        "/save-api",
        Some(json!({"fileName": "auth.json"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(as_json(&body)["error"], "fileName and data required");

    let (status, _, _) = send(addr, Method::POST, "/update-index", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_save_api_rejects_malformed_groups() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;

    let (status, _, body) = send(
        addr,
        Method::POST,
        "/save-api",
        Some(json!({"fileName": "x.json", "data": {"endpoints": "nope", "group": 5}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(as_json(&body)["error"].is_string());

    let duplicated = json!({
        "group": "Users",
        "endpoints": [
            {"id": "get-users", "method": "GET", "path": "/users"},
            {"id": "get-users", "method": "GET", "path": "/users"}
        ]
    });
    let (status, _, body) = send(
        addr,
        Method::POST,
        "/save-api",
        Some(json!({"fileName": "users.json", "data": duplicated})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(as_json(&body)["error"]
        .as_str()
        .is_some_and(|e| e.contains("get-users")));

    assert!(!dir.path().join("apis/x.json").exists());
    assert!(!dir.path().join("apis/users.json").exists());
}

#[tokio::test]
async fn test_static_root_and_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let site = dir.path().join("site");
    std::fs::create_dir_all(&site).unwrap();
    std::fs::write(dir.path().join("secret.txt"), "top secret").unwrap();
    let addr = start_server(&site).await;

    let (status, _, body) = send(addr, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"<h1>docs</h1>");

    let (status, _, body) = send(addr, Method::GET, "/%2e%2e%2fsecret.txt", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!String::from_utf8_lossy(&body).contains("secret"));

    let (status, _, _) = send(addr, Method::GET, "/missing.css", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(addr, Method::DELETE, "/index.html", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_common_headers_round_trip_through_env_file() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(dir.path()).await;

    let (status, _, body) = send(addr, Method::GET, "/get-config", None).await;
    assert_eq!(status, StatusCode::OK);
    let cfg = as_json(&body);
    assert_eq!(cfg["host"], "http://localhost:8080");
    assert_eq!(cfg["headers"], json!([]));

    let headers = json!([{"key": "Authorization", "value": "Bearer abc"}]);
    let (status, _, body) = send(
        addr,
        Method::POST,
        "/save-config",
        Some(json!({"headers": headers})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), json!({"ok": true}));

    let (_, _, body) = send(addr, Method::GET, "/get-config", None).await;
    assert_eq!(as_json(&body)["headers"], headers);

    let env = std::fs::read_to_string(dir.path().join("local.env")).unwrap();
    assert!(env.contains("PORT=3000"));
}
