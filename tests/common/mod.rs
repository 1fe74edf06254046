use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use axum_test::TestServer;
use rig_dashboard::config::{ConfigStore, Environment, RpcEndpoint};
use rig_dashboard::modules::auth::crud::AccessCrud;
use rig_dashboard::services::jwt::JwtService;
use rig_dashboard::services::metrics::MetricsRegistry;
use rig_dashboard::services::sink::MemorySink;
use rig_dashboard::{create_app, AppState};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const TEST_USER: &str = "operator";
pub const TEST_PASSWORD: &str = "TestPassword123!";
pub const TEST_JWT_KEY: &str = "0123456789abcdef0123456789abcdef";
pub const RPC_AUTH: &str = "rpcuser:rpcpass";
const RPC_BASIC_HEADER: &str = "Basic cnBjdXNlcjpycGNwYXNz";

// Allow dead_code for utilities used by other test files
#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub sink: Arc<MemorySink>,
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TestContext {
    /// Normal-mode app over a temp directory holding `config`, one account and a JWT key.
    pub async fn new(config: Value) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut env = Environment::rooted_at(dir.path());
        env.remote_timeout = Duration::from_secs(2);
        let env = Arc::new(env);

        write_setup_files(&env.config_dir, &config).await;
        write_pages(&env.public_dir);

        let store = Arc::new(ConfigStore::new(&env.config_dir));
        store.load().await.expect("Failed to load test config");

        let sink = Arc::new(MemorySink::new());
        let state = AppState::new(
            env,
            store,
            JwtService::new(TEST_JWT_KEY.to_string(), chrono::Duration::hours(1)),
            sink.clone(),
            MetricsRegistry::new().expect("Failed to create metrics registry"),
        );

        let server = TestServer::new(create_app(state.clone())).expect("Failed to create test server");

        Self {
            server,
            state,
            sink,
            dir,
        }
    }

    /// `Cookie` header carrying a valid session for `TEST_USER`.
    pub fn session_cookie(&self) -> (HeaderName, HeaderValue) {
        let token = self
            .state
            .jwt_service
            .create_token(TEST_USER)
            .expect("Failed to create token");
        let value = HeaderValue::from_str(&format!("sessionToken={}", token)).expect("Invalid cookie");
        (header::COOKIE, value)
    }

    pub async fn shutdown(&self) {
        self.state.scheduler.stop().await;
    }
}

#[allow(dead_code)]
pub async fn write_setup_files(config_dir: &Path, config: &Value) {
    std::fs::create_dir_all(config_dir).expect("Failed to create config dir");
    std::fs::write(
        config_dir.join("config.json"),
        serde_json::to_vec_pretty(config).expect("Invalid config"),
    )
    .expect("Failed to write config.json");
    std::fs::write(
        config_dir.join("jsonWebTokenKey.json"),
        json!({"jsonWebTokenKey": TEST_JWT_KEY, "expiresIn": "1h"}).to_string(),
    )
    .expect("Failed to write jsonWebTokenKey.json");

    AccessCrud::new(config_dir)
        .write(Some((TEST_USER, TEST_PASSWORD)))
        .await
        .expect("Failed to write access.json");
}

#[allow(dead_code)]
pub fn write_pages(public_dir: &Path) {
    let html = public_dir.join("html");
    std::fs::create_dir_all(&html).expect("Failed to create public dir");
    for page in ["dashboard.html", "login.html", "bootstrap.html"] {
        std::fs::write(
            html.join(page),
            "<html><title><!-- TITLE --></title><body>v<!-- VERSION --> &copy; <!-- CURRENT_YEAR --></body></html>",
        )
        .expect("Failed to write page");
    }
}

/// Serve `app` on an ephemeral local port and return its base URL.
#[allow(dead_code)]
pub async fn spawn_peer(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind peer");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

/// A mining device answering the default AxeOS endpoints.
#[allow(dead_code)]
pub fn healthy_device(hostname: &'static str) -> Router {
    Router::new()
        .route(
            "/api/system/info",
            get(move || async move {
                Json(json!({
                    "hostname": hostname,
                    "hashRate": 512.5,
                    "temp": 58.0,
                    "power": 14.2,
                    "fanspeed": 60,
                    "bestDiff": "1.2M",
                    "sharesAccepted": 100,
                    "sharesRejected": 2,
                    "frequency": 525,
                    "voltage": 5.1,
                    "coreVoltage": 1200
                }))
            }),
        )
        .route("/api/system/restart", post(|| async { "System will restart shortly" }))
        .route("/api/system", patch(|| async { StatusCode::OK }))
        .route(
            "/api/system/statistics/dashboard",
            get(|| async { Json(json!({"currentTimestamp": 1, "statistics": [[512.5, 58.0]]})) }),
        )
}

#[allow(dead_code)]
pub fn failing_device() -> Router {
    Router::new().fallback(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") })
}

/// Minimal config with authentication on and one entry per device URL.
#[allow(dead_code)]
pub fn device_config(devices: &[(&str, &str)]) -> Value {
    let instances: Vec<Value> = devices.iter().map(|(name, url)| json!({ (*name): url })).collect();
    json!({
        "title": "Test Rigs",
        "web_server_port": 3000,
        "axeos_instances": instances,
        "display_fields": [],
        "disable_authentication": false,
        "disable_settings": false,
        "disable_configurations": false,
        "cookie_max_age": 3600
    })
}

/// JSON-RPC node answering the four status calls. Methods listed in `failing`
/// answer with an RPC error object; wrong credentials get an empty 401.
#[allow(dead_code)]
pub fn rpc_node(failing: &'static [&'static str]) -> Router {
    Router::new().route(
        "/",
        post(move |headers: HeaderMap, Json(request): Json<Value>| async move {
            let authorized = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v == RPC_BASIC_HEADER);
            if !authorized {
                return StatusCode::UNAUTHORIZED.into_response();
            }

            let method = request["method"].as_str().unwrap_or_default().to_string();
            if failing.contains(&method.as_str()) {
                let body = json!({
                    "result": null,
                    "error": {"code": -1, "message": format!("\"{}\" failed", method)},
                    "id": request["id"]
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }

            let result = match method.as_str() {
                "getblockchaininfo" => json!({"chain": "main", "blocks": 812345, "difficulty": 86.5, "networkhashps": 1.2e18}),
                "getnettotals" => json!({"totalbytesrecv": 1024, "totalbytessent": 2048}),
                "getbalance" => json!(12.5),
                "getnetworkinfo" => json!({"connections": 8, "subversion": "/Satoshi:26.0.0/"}),
                _ => {
                    let body = json!({"result": null, "error": {"code": -32601, "message": "Method not found"}, "id": request["id"]});
                    return (StatusCode::NOT_FOUND, Json(body)).into_response();
                }
            };
            Json(json!({"result": result, "error": null, "id": request["id"]})).into_response()
        }),
    )
}

/// Endpoint entry for a node served at `base_url` (as returned by `spawn_peer`).
#[allow(dead_code)]
pub fn rpc_endpoint(node_id: &str, base_url: &str, auth: &str) -> RpcEndpoint {
    let (host, port) = base_url
        .trim_start_matches("http://")
        .rsplit_once(':')
        .expect("peer url has a port");
    RpcEndpoint {
        node_id: node_id.to_string(),
        address: host.to_string(),
        port: port.parse().expect("numeric port"),
        auth: auth.to_string(),
    }
}

/// `rpcConfig.json` content for the given endpoints.
#[allow(dead_code)]
pub fn rpc_config(endpoints: &[RpcEndpoint]) -> Value {
    json!({ "cryptoNodes": endpoints })
}

/// Grouped `cryptoNodes` entry for one node.
#[allow(dead_code)]
pub fn crypto_nodes(node_id: &str, name: &str) -> Value {
    json!([{
        "Nodes": [{"NodeId": node_id, "NodeName": name, "NodeType": node_id, "NodeAlgo": "sha256d"}],
        "NodeDisplayFields": [{"Node Info": [{"blocks": "Block Height"}]}]
    }])
}

/// A Miningcore instance serving one pool.
#[allow(dead_code)]
pub fn miningcore(pool_id: &'static str) -> Router {
    Router::new().route(
        "/api/pools",
        get(move || async move {
            Json(json!({
                "pools": [{
                    "id": pool_id,
                    "coin": {"type": "DGB"},
                    "poolStats": {"poolHashrate": 1.5e12, "connectedMiners": 3},
                    "networkStats": {"networkHashrate": 2.0e15, "networkDifficulty": 3.0},
                    "totalBlocks": 7
                }]
            }))
        }),
    )
}
