//! End-to-end marketplace flow, dashboards and the route-level role gate.

mod common;

use axum::http::StatusCode;
use common::{package_body, TestApp, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn vendor_listing_to_completed_trip() {
    let app = TestApp::new();

    let (_, body) = app
        .post(
            "/auth/register",
            None,
            json!({
                "name": "Kerala Tours",
                "email": "kerala@example.com",
                "password": PASSWORD,
                "role": "vendor",
                "vendorProfile": { "companyName": "Kerala Tours Pvt", "phone": "555-0100" }
            }),
        )
        .await;
    assert_eq!(body["user"]["vendorProfile"]["companyName"], "Kerala Tours Pvt");

    let (status, login) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "kerala@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let vendor_token = login["token"].as_str().expect("token").to_string();

    let (status, package) = app
        .post(
            "/packages",
            Some(&vendor_token),
            package_body("Backwater Escape", "Kumarakom", 640.0),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(package["status"], "pending");
    let package_id = package["id"].as_str().expect("package id").to_string();

    let (admin_token, _) = app.seed_admin("admin@example.com").await;
    app.approve(&admin_token, &package_id).await;

    let (user_token, _) = app.register_user("traveler@example.com").await;
    let (status, booking) = app
        .post("/bookings", Some(&user_token), json!({ "packageId": package_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["status"], "pending");
    let booking_id = booking["id"].as_str().expect("booking id").to_string();

    let (status, confirmed) = app
        .put(&format!("/bookings/{}/confirm", booking_id), Some(&vendor_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");
    assert!(confirmed["confirmedAt"].is_string());

    let (status, completed) = app
        .put(&format!("/bookings/{}/complete", booking_id), Some(&vendor_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["status"], "completed");
    assert!(completed["completedAt"].is_string());

    let (status, body) = app
        .put(&format!("/bookings/{}/cancel", booking_id), Some(&user_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_transition");
}

#[tokio::test]
async fn traveler_is_kept_out_of_vendor_and_admin_routes() {
    let app = TestApp::new();
    let (user_token, user_id) = app.register_user("traveler@example.com").await;
    let token = Some(user_token.as_str());

    let checks = [
        app.post("/packages", token, package_body("X", "Y", 1.0)).await,
        app.put("/packages/any", token, json!({ "price": 1.0 })).await,
        app.delete("/packages/any", token).await,
        app.get("/vendor/packages", token).await,
        app.put("/packages/any/approval", token, json!({ "decision": "approve" })).await,
        app.get("/admin/packages", token).await,
        app.get("/admin/users", token).await,
        app.put(&format!("/admin/users/{}", user_id), token, json!({ "role": "admin" })).await,
    ];

    for (status, body) in checks {
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["kind"], "forbidden");
    }
}

#[tokio::test]
async fn vendor_is_kept_out_of_admin_routes() {
    let app = TestApp::new();
    let (vendor_token, _) = app.register_vendor("vendor@example.com").await;

    let (status, _) = app.get("/admin/users", Some(&vendor_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn promoted_user_gets_new_role_on_next_login() {
    let app = TestApp::new();
    let (user_token, user_id) = app.register_user("grower@example.com").await;
    let (admin_token, _) = app.seed_admin("admin@example.com").await;

    let (status, body) = app
        .put(
            &format!("/admin/users/{}", user_id),
            Some(&admin_token),
            json!({ "role": "vendor" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "vendor");
    assert!(body["vendorProfile"]["companyName"].is_string());

    // The old token still carries the old role.
    let (status, _) = app.get("/vendor/packages", Some(&user_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, login) = app
        .post(
            "/auth/login",
            None,
            json!({ "email": "grower@example.com", "password": PASSWORD }),
        )
        .await;
    let new_token = login["token"].as_str().expect("token");
    let (status, _) = app.get("/vendor/packages", Some(new_token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn dashboards_are_scoped_by_role() {
    let app = TestApp::new();
    let (vendor_token, _, admin_token, package_id) = app.approved_package(300.0).await;
    let (user_token, _) = app.register_user("traveler@example.com").await;

    let mut booking_ids = Vec::new();
    for _ in 0..2 {
        let (_, booking) = app
            .post("/bookings", Some(&user_token), json!({ "packageId": package_id }))
            .await;
        booking_ids.push(booking["id"].as_str().expect("booking id").to_string());
    }
    app.put(
        &format!("/bookings/{}/cancel", booking_ids[1]),
        Some(&user_token),
        json!({}),
    )
    .await;
    app.get(&format!("/packages/{}", package_id), None).await;

    let (status, user_stats) = app.get("/dashboard/stats", Some(&user_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user_stats["role"], "user");
    assert!(user_stats.get("admin").is_none());
    assert_eq!(user_stats["user"]["bookings"]["total"], 2);
    assert_eq!(user_stats["user"]["bookings"]["cancelled"], 1);
    assert_eq!(user_stats["user"]["totalSpent"], 300.0);

    let (_, vendor_stats) = app.get("/dashboard/stats", Some(&vendor_token)).await;
    assert_eq!(vendor_stats["role"], "vendor");
    assert_eq!(vendor_stats["vendor"]["packages"]["approved"], 1);
    assert_eq!(vendor_stats["vendor"]["bookings"]["pending"], 1);
    assert_eq!(vendor_stats["vendor"]["revenue"], 300.0);
    assert_eq!(vendor_stats["vendor"]["totalViews"], 1);

    let (_, admin_stats) = app.get("/dashboard/stats", Some(&admin_token)).await;
    assert_eq!(admin_stats["role"], "admin");
    assert_eq!(admin_stats["admin"]["users"]["user"], 1);
    assert_eq!(admin_stats["admin"]["users"]["vendor"], 1);
    assert_eq!(admin_stats["admin"]["users"]["admin"], 1);
    assert_eq!(admin_stats["admin"]["users"]["total"], 3);
    assert_eq!(admin_stats["admin"]["packages"]["total"], 1);
    assert_eq!(admin_stats["admin"]["bookings"]["total"], 2);
    assert_eq!(admin_stats["admin"]["revenue"], 300.0);
}

#[tokio::test]
async fn operational_endpoints_are_public() {
    let app = TestApp::new();

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = app.get("/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, doc) = app.get("/.well-known/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/bookings/{id}/{action}"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}
