use axum::http::{header, StatusCode};
use serde_json::{json, Value};

use crate::common::{device_config, TestContext, TEST_PASSWORD, TEST_USER};

#[tokio::test]
async fn api_without_session_is_unauthorized() {
    let ctx = TestContext::new(device_config(&[])).await;

    let response = ctx.server.get("/api/systems/info").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn page_without_session_redirects_to_login() {
    let ctx = TestContext::new(device_config(&[])).await;

    let response = ctx.server.get("/").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header(header::LOCATION), "/login");
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let ctx = TestContext::new(device_config(&[])).await;

    let response = ctx
        .server
        .post("/api/login")
        .json(&json!({"username": TEST_USER, "password": TEST_PASSWORD}))
        .await;

    response.assert_status_ok();
    let cookie = response.header(header::SET_COOKIE);
    let cookie = cookie.to_str().unwrap();
    assert!(cookie.starts_with("sessionToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=3600"));

    let body: Value = response.json();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let ctx = TestContext::new(device_config(&[])).await;

    let response = ctx
        .server
        .post("/api/login")
        .json(&json!({"username": TEST_USER, "password": "not-the-password"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn disabled_authentication_skips_session_check() {
    let mut config = device_config(&[]);
    config["disable_authentication"] = json!(true);
    let ctx = TestContext::new(config).await;

    ctx.server.get("/api/systems/info").await.assert_status_ok();

    let page = ctx.server.get("/").await;
    page.assert_status_ok();
    assert!(page.text().contains("Test Rigs"));
}

#[tokio::test]
async fn logout_expires_cookie() {
    let ctx = TestContext::new(device_config(&[])).await;

    let response = ctx.server.post("/api/logout").await;
    response.assert_status_ok();
    let cookie = response.header(header::SET_COOKIE);
    assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let ctx = TestContext::new(device_config(&[])).await;

    let response = ctx.server.get("/health").await;
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "SAMEORIGIN");
}
