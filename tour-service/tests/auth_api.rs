//! Registration, login and account administration over HTTP.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{test_config, TestApp, PASSWORD};
use serde_json::json;
use tour_service::models::Role;
use tower::ServiceExt;

#[tokio::test]
async fn register_then_login_returns_working_token() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/auth/register",
            None,
            json!({ "name": "Asha", "email": "Asha@Example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "asha@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token");

    let (status, me) = app.get("/auth/me", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], body["user"]["id"]);
    assert!(me["lastLogin"].is_string());
}

#[tokio::test]
async fn register_reports_every_missing_field() {
    let app = TestApp::new();

    let (status, body) = app.post("/auth/register", None, json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn duplicate_email_is_a_field_error() {
    let app = TestApp::new();
    app.register_user("dup@example.com").await;

    let (status, body) = app
        .post(
            "/auth/register",
            None,
            json!({ "name": "Again", "email": "DUP@example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "email");
}

#[tokio::test]
async fn admin_role_cannot_be_self_registered() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/auth/register",
            None,
            json!({ "name": "Eve", "email": "eve@example.com", "password": PASSWORD, "role": "admin" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "role");
}

#[tokio::test]
async fn vendor_registration_requires_company_name() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/auth/register",
            None,
            json!({
                "name": "Vendor",
                "email": "vendor@example.com",
                "password": PASSWORD,
                "role": "vendor",
                "vendorProfile": { "phone": "555-0100" }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "vendorProfile.companyName");
}

#[tokio::test]
async fn registration_rule_violations_are_reported_together() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/auth/register",
            None,
            json!({
                "name": "   ",
                "email": "blank@example.com",
                "password": PASSWORD,
                "role": "vendor"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert!(fields.contains(&"name"), "missing name in {fields:?}");
    assert!(fields.contains(&"vendorProfile"), "missing vendorProfile in {fields:?}");
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::new();
    app.register_user("known@example.com").await;

    let (wrong_status, wrong_body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "known@example.com", "password": "not-the-password" }),
        )
        .await;
    let (unknown_status, unknown_body) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body["error"], unknown_body["error"]);
}

#[tokio::test]
async fn missing_and_garbage_tokens_are_unauthenticated() {
    let app = TestApp::new();

    let (status, body) = app.get("/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthenticated");

    let (status, body) = app.get("/auth/me", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn disabled_account_cannot_log_in() {
    let app = TestApp::new();
    let (_, user_id) = app.register_user("leaving@example.com").await;
    let (admin_token, _) = app.seed_admin("admin@example.com").await;

    let (status, body) = app
        .put(
            &format!("/admin/users/{}", user_id),
            Some(&admin_token),
            json!({ "active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    let (status, _) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "leaving@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_in_flight_keeps_a_concurrent_admin_change() {
    let app = TestApp::new();
    let (_, user_id) = app.register_user("moving@example.com").await;
    let (admin_token, _) = app.seed_admin("admin@example.com").await;

    let login = app.post(
        "/auth/login",
        None,
        json!({ "email": "moving@example.com", "password": PASSWORD }),
    );
    let admin_update = async {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        app.put(
            &format!("/admin/users/{}", user_id),
            Some(&admin_token),
            json!({ "active": false, "role": "vendor" }),
        )
        .await
    };
    let ((_, _), (update_status, _)) = tokio::join!(login, admin_update);
    assert_eq!(update_status, StatusCode::OK);

    let stored = app
        .store
        .find_user_by_id(&user_id)
        .await
        .expect("store read")
        .expect("user exists");
    assert!(!stored.active);
    assert_eq!(stored.role, Role::Vendor);
}

#[tokio::test]
async fn admin_lists_users_by_role() {
    let app = TestApp::new();
    app.register_user("a@example.com").await;
    app.register_user("b@example.com").await;
    app.register_vendor("v@example.com").await;
    let (admin_token, _) = app.seed_admin("admin@example.com").await;

    let (status, body) = app
        .get("/admin/users?role=user&limit=1", Some(&admin_token))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["totalPages"], 2);
}

#[tokio::test]
async fn admin_cannot_disable_self() {
    let app = TestApp::new();
    let (admin_token, admin_id) = app.seed_admin("admin@example.com").await;

    let (status, body) = app
        .put(
            &format!("/admin/users/{}", admin_id),
            Some(&admin_token),
            json!({ "active": false }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_state");
}

#[tokio::test]
async fn login_is_rate_limited_per_client_ip() {
    let mut config = test_config();
    config.rate_limit.login_attempts = 2;
    let app = TestApp::with_config(config);

    let attempt = || {
        Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(
                json!({ "email": "who@example.com", "password": PASSWORD }).to_string(),
            ))
            .expect("request should build")
    };

    for _ in 0..2 {
        let response = app.router.clone().oneshot(attempt()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app.router.clone().oneshot(attempt()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}
