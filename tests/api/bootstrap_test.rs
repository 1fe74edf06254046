use axum::http::StatusCode;
use axum_test::TestServer;
use rig_dashboard::config::{ConfigStore, Environment};
use rig_dashboard::create_bootstrap_app;
use rig_dashboard::modules::auth::crud::AccessCrud;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::common::write_pages;

fn bootstrap_server(dir: &std::path::Path) -> (TestServer, Arc<Environment>) {
    let env = Arc::new(Environment::rooted_at(dir));
    write_pages(&env.public_dir);
    let server = TestServer::new(create_bootstrap_app(env.clone())).expect("Failed to create test server");
    (server, env)
}

fn form() -> Value {
    json!({
        "title": "Garage Rigs",
        "port": "4000",
        "enableAuth": "true",
        "username": "admin",
        "password": "s3cret",
        "confirmPassword": "s3cret",
        "jwtKey": "abcdefghijklmnopqrstuvwxyz012345",
        "jwtExpiry": "8h",
        "bitaxeInstances": [{"name": "rig-a", "url": "http://192.168.1.20"}],
        "enableMiningCore": "false",
        "miningCoreInstances": [],
        "enableCryptoNode": "true",
        "cryptoNodeType": "dgb",
        "cryptoNodeName": "DigiByte",
        "cryptoNodeAlgo": "sha256d",
        "cryptoNodeId": "dgb-main",
        "cryptoNodeRpcIp": "192.168.1.5",
        "cryptoNodeRpcPort": "14022",
        "cryptoNodeRpcAuth": "user:pass"
    })
}

#[tokio::test]
async fn setup_page_fills_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let (server, _env) = bootstrap_server(dir.path());

    let response = server.get("/").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains("AxeOS Dashboard"));
    assert!(!html.contains("<!-- CURRENT_YEAR -->"));
}

#[tokio::test]
async fn submit_writes_every_setup_file() {
    let dir = tempfile::tempdir().unwrap();
    let (server, env) = bootstrap_server(dir.path());

    let response = server.post("/bootstrap").json(&form()).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let store = ConfigStore::new(&env.config_dir);
    assert!(store.required_artifacts_exist());
    let settings = store.load().await.unwrap();
    assert_eq!(settings.title, "Garage Rigs");
    assert_eq!(settings.web_server_port, 4000);
    assert_eq!(settings.cookie_max_age, 28_800);
    assert_eq!(settings.device_peers()[0].name, "rig-a");
    assert_eq!(settings.node_peers()[0].id, "dgb-main");

    let directory = rig_dashboard::config::RpcDirectory::load(&env.config_dir).await.unwrap();
    let endpoint = directory.get("dgb-main").unwrap();
    assert_eq!(endpoint.url(), "http://192.168.1.5:14022");
    assert_eq!(endpoint.credentials(), Some(("user", "pass")));

    AccessCrud::new(&env.config_dir).verify("admin", "s3cret").await.unwrap();
}

#[tokio::test]
async fn submit_without_auth_writes_random_key() {
    let dir = tempfile::tempdir().unwrap();
    let (server, env) = bootstrap_server(dir.path());

    let mut body = form();
    body["enableAuth"] = json!("false");
    body["enableCryptoNode"] = json!(false);
    server.post("/bootstrap").json(&body).await.assert_status_ok();

    let key: Value = serde_json::from_str(
        &std::fs::read_to_string(env.config_dir.join("jsonWebTokenKey.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(key["jsonWebTokenKey"].as_str().unwrap().len(), 32);
    assert!(!env.config_dir.join("rpcConfig.json").exists());

    let access = std::fs::read_to_string(env.config_dir.join("access.json")).unwrap();
    assert_eq!(access.trim(), "{}");

    let settings = ConfigStore::new(&env.config_dir).load().await.unwrap();
    assert!(settings.disable_authentication);
}

#[tokio::test]
async fn submit_validation_failures() {
    let dir = tempfile::tempdir().unwrap();
    let (server, env) = bootstrap_server(dir.path());

    let mut no_title = form();
    no_title["title"] = json!("");
    let response = server.post("/bootstrap").json(&no_title).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "Title is required");

    let mut short_key = form();
    short_key["jwtKey"] = json!("too-short");
    let response = server.post("/bootstrap").json(&short_key).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["message"], "JWT key must be 32 characters");

    let mut no_devices = form();
    no_devices["bitaxeInstances"] = json!([]);
    server
        .post("/bootstrap")
        .json(&no_devices)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert!(!ConfigStore::new(&env.config_dir).required_artifacts_exist());
}
