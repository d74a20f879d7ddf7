//! Shared harness: the full router over the in-memory store.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use tour_service::{
    build_router,
    config::{
        Environment, JwtConfig, RateLimitConfig, SecurityConfig, StoreBackend, TourConfig,
    },
    models::{Role, User},
    services::{MemoryStore, TourStore},
    utils::{hash_password, Password},
    AppState,
};

pub const PASSWORD: &str = "password123";

pub fn test_config() -> TourConfig {
    TourConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "tour-service-test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        store: StoreBackend::Memory,
        mongodb: None,
        jwt: JwtConfig {
            secret: SecretString::new("integration-test-secret-0123456789abcdef".to_string()),
            expiry_minutes: 60,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
            register_attempts: 100,
            register_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn TourStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: TourConfig) -> Self {
        let store: Arc<dyn TourStore> = Arc::new(MemoryStore::new());
        let router = build_router(AppState::new(config, store.clone()));
        Self { router, store }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Registers a traveler and returns `(token, user_id)`.
    pub async fn register_user(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                json!({ "name": "Traveler", "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        credentials(&body)
    }

    pub async fn register_vendor(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/auth/register",
                None,
                json!({
                    "name": "Vendor",
                    "email": email,
                    "password": PASSWORD,
                    "role": "vendor",
                    "vendorProfile": { "companyName": "Backwater Trails" }
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "vendor register failed: {body}");
        credentials(&body)
    }

    /// Admins cannot self-register, so they are written to the store and then
    /// logged in over HTTP.
    pub async fn seed_admin(&self, email: &str) -> (String, String) {
        let hash = hash_password(Password::new(PASSWORD.to_string()))
            .await
            .expect("hashing should succeed");
        let admin = User::new(
            "Admin".to_string(),
            email,
            hash.into_string(),
            Role::Admin,
            None,
        );
        self.store
            .insert_user(&admin)
            .await
            .expect("admin insert should succeed");

        let (status, body) = self
            .post(
                "/auth/login",
                None,
                json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {body}");
        credentials(&body)
    }

    /// Creates a package as `token` and returns its id.
    pub async fn create_package(&self, token: &str, title: &str, price: f64) -> String {
        let (status, body) = self
            .post("/packages", Some(token), package_body(title, "Alleppey", price))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create package failed: {body}");
        body["id"].as_str().expect("package id").to_string()
    }

    pub async fn approve(&self, admin_token: &str, package_id: &str) {
        let (status, body) = self
            .put(
                &format!("/packages/{}/approval", package_id),
                Some(admin_token),
                json!({ "decision": "approve" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "approval failed: {body}");
    }

    /// Vendor package approved by a freshly seeded admin; returns
    /// `(vendor_token, vendor_id, admin_token, package_id)`.
    pub async fn approved_package(&self, price: f64) -> (String, String, String, String) {
        let (vendor_token, vendor_id) = self.register_vendor("vendor@example.com").await;
        let (admin_token, _) = self.seed_admin("admin@example.com").await;
        let package_id = self
            .create_package(&vendor_token, "Kerala Backwaters", price)
            .await;
        self.approve(&admin_token, &package_id).await;
        (vendor_token, vendor_id, admin_token, package_id)
    }
}

pub fn package_body(title: &str, destination: &str, price: f64) -> Value {
    json!({
        "title": title,
        "description": "Houseboat cruise through the backwaters",
        "destination": destination,
        "duration": "3 days / 2 nights",
        "price": price,
        "included": ["meals", "transfers"],
        "itinerary": [
            { "day": 1, "description": "Arrival and check-in" },
            { "day": 2, "description": "Houseboat cruise" }
        ]
    })
}

fn credentials(body: &Value) -> (String, String) {
    (
        body["token"].as_str().expect("token").to_string(),
        body["user"]["id"].as_str().expect("user id").to_string(),
    )
}
