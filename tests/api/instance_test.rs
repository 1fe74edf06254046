use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{device_config, failing_device, healthy_device, spawn_peer, TestContext};

#[tokio::test]
async fn info_proxies_one_device() {
    let a = spawn_peer(healthy_device("rig-a")).await;
    let ctx = TestContext::new(device_config(&[("rig-a", a.as_str())])).await;
    let (name, value) = ctx.session_cookie();

    let response = ctx
        .server
        .get("/api/instance/info")
        .add_query_param("instanceId", "rig-a")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["hostname"], "rig-a");
}

#[tokio::test]
async fn unknown_or_missing_instance() {
    let ctx = TestContext::new(device_config(&[])).await;
    let (name, value) = ctx.session_cookie();

    ctx.server
        .get("/api/instance/info")
        .add_header(name.clone(), value.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    ctx.server
        .get("/api/instance/info")
        .add_query_param("instanceId", "ghost")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn device_status_is_passed_through() {
    let broken = spawn_peer(failing_device()).await;
    let ctx = TestContext::new(device_config(&[("rig-x", broken.as_str())])).await;
    let (name, value) = ctx.session_cookie();

    ctx.server
        .get("/api/instance/info")
        .add_query_param("instanceId", "rig-x")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn restart_and_settings_reach_the_device() {
    let a = spawn_peer(healthy_device("rig-a")).await;
    let ctx = TestContext::new(device_config(&[("rig-a", a.as_str())])).await;
    let (name, value) = ctx.session_cookie();

    let restart: Value = ctx
        .server
        .post("/api/instance/service/restart")
        .add_query_param("instanceId", "rig-a")
        .add_header(name.clone(), value.clone())
        .await
        .json();
    assert_eq!(restart["success"], true);

    ctx.server
        .patch("/api/instance/service/settings")
        .add_query_param("instanceId", "rig-a")
        .add_header(name.clone(), value.clone())
        .json(&json!({"frequency": 550}))
        .await
        .assert_status_ok();

    let stats: Value = ctx
        .server
        .get("/api/statistics")
        .add_query_param("instanceId", "rig-a")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(stats["success"], true);
    assert_eq!(stats["instanceId"], "rig-a");
}

#[tokio::test]
async fn disabled_settings_forbid_restart() {
    let a = spawn_peer(healthy_device("rig-a")).await;
    let mut config = device_config(&[("rig-a", a.as_str())]);
    config["disable_settings"] = json!(true);
    let ctx = TestContext::new(config).await;
    let (name, value) = ctx.session_cookie();

    ctx.server
        .post("/api/instance/service/restart")
        .add_query_param("instanceId", "rig-a")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
