//! Booking creation, the status state machine and payment updates.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

async fn book(app: &TestApp, token: &str, package_id: &str) -> String {
    let (status, body) = app
        .post("/bookings", Some(token), json!({ "packageId": package_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "booking failed: {body}");
    body["id"].as_str().expect("booking id").to_string()
}

#[tokio::test]
async fn booking_captures_price_and_starts_pending() {
    let app = TestApp::new();
    let (_, vendor_id, _, package_id) = app.approved_package(375.5).await;
    let (user_token, user_id) = app.register_user("traveler@example.com").await;

    let (status, body) = app
        .post("/bookings", Some(&user_token), json!({ "packageId": package_id }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["paymentStatus"], "pending");
    assert_eq!(body["amount"], 375.5);
    assert_eq!(body["userId"], user_id.as_str());
    assert_eq!(body["vendorId"], vendor_id.as_str());

    let (_, package) = app.get(&format!("/packages/{}", package_id), None).await;
    assert_eq!(package["bookingsCount"], 1);
}

#[tokio::test]
async fn pending_packages_cannot_be_booked() {
    let app = TestApp::new();
    let (vendor_token, _) = app.register_vendor("vendor@example.com").await;
    let package_id = app.create_package(&vendor_token, "Not yet", 100.0).await;
    let (user_token, _) = app.register_user("traveler@example.com").await;

    let (status, body) = app
        .post("/bookings", Some(&user_token), json!({ "packageId": package_id }))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_state");

    let (status, _) = app
        .post("/bookings", Some(&user_token), json!({ "packageId": "missing" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.post("/bookings", Some(&user_token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "packageId");
}

#[tokio::test]
async fn complete_requires_confirmation_first() {
    let app = TestApp::new();
    let (vendor_token, _, _, package_id) = app.approved_package(200.0).await;
    let (user_token, _) = app.register_user("traveler@example.com").await;
    let booking_id = book(&app, &user_token, &package_id).await;

    let (status, body) = app
        .put(&format!("/bookings/{}/complete", booking_id), Some(&vendor_token), json!({}))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_transition");
}

#[tokio::test]
async fn cancelled_bookings_cannot_be_confirmed() {
    let app = TestApp::new();
    let (vendor_token, _, _, package_id) = app.approved_package(200.0).await;
    let (user_token, user_id) = app.register_user("traveler@example.com").await;
    let booking_id = book(&app, &user_token, &package_id).await;

    let (status, body) = app
        .put(&format!("/bookings/{}/cancel", booking_id), Some(&user_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["cancelledBy"], user_id.as_str());
    assert!(body["cancelledAt"].is_string());

    let (status, body) = app
        .put(&format!("/bookings/{}/confirm", booking_id), Some(&vendor_token), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_transition");
}

#[tokio::test]
async fn travelers_cannot_confirm_their_own_booking() {
    let app = TestApp::new();
    let (_, _, _, package_id) = app.approved_package(200.0).await;
    let (user_token, _) = app.register_user("traveler@example.com").await;
    let booking_id = book(&app, &user_token, &package_id).await;

    let (status, _) = app
        .put(&format!("/bookings/{}/confirm", booking_id), Some(&user_token), json!({}))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_action_is_rejected() {
    let app = TestApp::new();
    let (vendor_token, _, _, package_id) = app.approved_package(200.0).await;
    let (user_token, _) = app.register_user("traveler@example.com").await;
    let booking_id = book(&app, &user_token, &package_id).await;

    let (status, body) = app
        .put(&format!("/bookings/{}/refund", booking_id), Some(&vendor_token), json!({}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "action");
}

#[tokio::test]
async fn bookings_are_visible_to_participants_only() {
    let app = TestApp::new();
    let (vendor_token, _, admin_token, package_id) = app.approved_package(200.0).await;
    let (user_token, _) = app.register_user("traveler@example.com").await;
    let (other_token, _) = app.register_user("other@example.com").await;
    let (rival_token, _) = app.register_vendor("rival@example.com").await;
    let booking_id = book(&app, &user_token, &package_id).await;
    let uri = format!("/bookings/{}", booking_id);

    for token in [&user_token, &vendor_token, &admin_token] {
        let (status, _) = app.get(&uri, Some(token)).await;
        assert_eq!(status, StatusCode::OK);
    }
    for token in [&other_token, &rival_token] {
        let (status, _) = app.get(&uri, Some(token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (_, mine) = app.get("/bookings", Some(&user_token)).await;
    assert_eq!(mine["bookings"].as_array().map(Vec::len), Some(1));
    let (_, theirs) = app.get("/bookings", Some(&other_token)).await;
    assert_eq!(theirs["bookings"].as_array().map(Vec::len), Some(0));
    let (_, vendor_view) = app.get("/bookings", Some(&vendor_token)).await;
    assert_eq!(vendor_view["bookings"].as_array().map(Vec::len), Some(1));
    let (_, rival_view) = app.get("/bookings", Some(&rival_token)).await;
    assert_eq!(rival_view["bookings"].as_array().map(Vec::len), Some(0));
    let (_, admin_view) = app.get("/bookings?status=pending", Some(&admin_token)).await;
    assert_eq!(admin_view["bookings"].as_array().map(Vec::len), Some(1));
    let (_, admin_view) = app.get("/bookings?status=completed", Some(&admin_token)).await;
    assert_eq!(admin_view["bookings"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn payment_status_follows_its_own_rules() {
    let app = TestApp::new();
    let (vendor_token, _, _, package_id) = app.approved_package(200.0).await;
    let (user_token, _) = app.register_user("traveler@example.com").await;
    let booking_id = book(&app, &user_token, &package_id).await;
    let uri = format!("/bookings/{}/payment", booking_id);

    let (status, _) = app
        .put(&uri, Some(&user_token), json!({ "paymentStatus": "paid" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(&uri, Some(&vendor_token), json!({ "paymentStatus": "refunded" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .put(&uri, Some(&vendor_token), json!({ "paymentStatus": "paid" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentStatus"], "paid");
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn vendor_cannot_delete_booked_package_but_admin_can() {
    let app = TestApp::new();
    let (vendor_token, _, admin_token, package_id) = app.approved_package(200.0).await;
    let (user_token, _) = app.register_user("traveler@example.com").await;
    let booking_id = book(&app, &user_token, &package_id).await;
    let uri = format!("/packages/{}", package_id);

    let (status, body) = app.delete(&uri, Some(&vendor_token)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");

    let (status, _) = app.delete(&uri, Some(&admin_token)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .get(&format!("/bookings/{}", booking_id), Some(&user_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["packageId"], package_id.as_str());
}
