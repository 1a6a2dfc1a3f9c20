//! End-to-end coverage over the full router for the scenarios that need
//! more than one HTTP round trip to exercise: cross-operator machine
//! isolation (S3), API-key rotation invalidating the old key (S4), and the
//! last-admin deletion guard (S6).

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use lunasentri_server::prelude::*;

async fn test_state() -> AppState {
    let store = lunasentri_infra_store::StoreClient::connect(":memory:", None)
        .await
        .expect("in-memory store connects");
    let config = Config {
        session_secret: "integration-test-secret".to_string(),
        access_ttl_minutes: 15,
        reset_ttl_minutes: 60,
        allowed_origin: "http://localhost:3000".to_string(),
        secure_cookies: false,
        database_url: ":memory:".to_string(),
        database_auth_token: None,
        admin_bootstrap_email: None,
        admin_bootstrap_password: None,
        telegram_bot_token: None,
        local_host_metrics: false,
        port: 0,
        dev_expose_reset_token: true,
    };
    AppState::new(store, config)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

fn session_cookie_header(response: &axum::response::Response) -> String {
    response
        .headers()
        .get("set-cookie")
        .expect("login sets a cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn login(router: &axum::Router, email: &str, password: &str) -> String {
    let login = json_request("POST", "/auth/login", None, json!({ "email": email, "password": password }));
    let resp = router.clone().oneshot(login).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    session_cookie_header(&resp)
}

async fn register_and_login(router: &axum::Router, email: &str, password: &str) -> String {
    let register = json_request(
        "POST",
        "/auth/register",
        None,
        json!({ "email": email, "password": password }),
    );
    let resp = router.clone().oneshot(register).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    login(router, email, password).await
}

/// S3: an operator may not read or mutate another operator's machine.
#[tokio::test]
async fn operator_cannot_access_another_operators_machine() {
    let state = test_state().await;
    let router = lunasentri_server::routes::build_router(state);

    let alice_cookie = register_and_login(&router, "alice@example.com", "correct-horse-1").await;
    let bob_cookie = register_and_login(&router, "bob@example.com", "correct-horse-2").await;

    let register_machine = json_request(
        "POST",
        "/agent/register",
        Some(&alice_cookie),
        json!({ "name": "alice-box" }),
    );
    let resp = router.clone().oneshot(register_machine).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    let machine_id = created["id"].as_i64().unwrap();

    let get_as_bob = empty_request("GET", &format!("/machines/{machine_id}"), Some(&bob_cookie));
    let resp = router.clone().oneshot(get_as_bob).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let get_as_alice = empty_request("GET", &format!("/machines/{machine_id}"), Some(&alice_cookie));
    let resp = router.clone().oneshot(get_as_alice).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

/// S4: rotating a machine's API key immediately invalidates the old one.
#[tokio::test]
async fn rotated_api_key_invalidates_the_old_key() {
    let state = test_state().await;
    let router = lunasentri_server::routes::build_router(state);

    let cookie = register_and_login(&router, "carol@example.com", "correct-horse-3").await;

    let register_machine = json_request("POST", "/agent/register", Some(&cookie), json!({ "name": "carol-box" }));
    let resp = router.clone().oneshot(register_machine).await.unwrap();
    let created = body_json(resp).await;
    let machine_id = created["id"].as_i64().unwrap();
    let old_key = created["api_key"].as_str().unwrap().to_string();

    let ingest_with_old_key = |key: String| {
        Request::builder()
            .method("POST")
            .uri("/agent/metrics")
            .header("content-type", "application/json")
            .header("x-api-key", key)
            .body(Body::from(
                json!({ "cpu_pct": 10.0, "mem_used_pct": 20.0, "disk_used_pct": 30.0 }).to_string(),
            ))
            .unwrap()
    };

    let resp = router.clone().oneshot(ingest_with_old_key(old_key.clone())).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let rotate = empty_request("POST", &format!("/machines/{machine_id}/rotate-key"), Some(&cookie));
    let resp = router.clone().oneshot(rotate).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated = body_json(resp).await;
    let new_key = rotated["api_key"].as_str().unwrap().to_string();
    assert_ne!(old_key, new_key);

    let resp = router.clone().oneshot(ingest_with_old_key(old_key)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = router.clone().oneshot(ingest_with_old_key(new_key)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
}

/// S6: the sole remaining admin cannot be deleted, and nobody can delete themselves.
#[tokio::test]
async fn last_admin_and_self_deletion_are_both_protected() {
    let state = test_state().await;
    let router = lunasentri_server::routes::build_router(state);

    let admin_cookie = register_and_login(&router, "admin@example.com", "correct-horse-4").await;

    let self_delete = empty_request("DELETE", "/auth/users/1", Some(&admin_cookie));
    let resp = router.clone().oneshot(self_delete).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let create_second = json_request(
        "POST",
        "/auth/users",
        Some(&admin_cookie),
        json!({ "email": "second@example.com", "password": "correct-horse-5" }),
    );
    let resp = router.clone().oneshot(create_second).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let second = body_json(resp).await;
    let second_id = second["id"].as_i64().unwrap();

    // The non-admin second operator is not the last admin and isn't deleting
    // itself, but only an admin may call this endpoint at all.
    let second_cookie = login(&router, "second@example.com", "correct-horse-5").await;
    let forbidden_attempt = empty_request("DELETE", "/auth/users/1", Some(&second_cookie));
    let resp = router.clone().oneshot(forbidden_attempt).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let delete_second_as_admin = empty_request("DELETE", &format!("/auth/users/{second_id}"), Some(&admin_cookie));
    let resp = router.clone().oneshot(delete_second_as_admin).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Now operator 1 is the only operator left; deleting it must be refused
    // even though it's no longer a self-delete in spirit — it's still the
    // sole admin.
    let delete_last_admin = empty_request("DELETE", "/auth/users/1", Some(&admin_cookie));
    let resp = router.clone().oneshot(delete_last_admin).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
