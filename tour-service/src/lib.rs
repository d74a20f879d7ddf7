pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{openapi::security::SecurityScheme, Modify, OpenApi};

use crate::config::TourConfig;
use crate::middleware::{auth_middleware, require_roles, RoleGate};
use crate::services::{
    policy, AuthService, BookingRepository, DashboardService, JwtService, PackageRepository,
    TourStore,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::packages::list_packages,
        handlers::packages::featured_packages,
        handlers::packages::get_package,
        handlers::packages::create_package,
        handlers::packages::update_package,
        handlers::packages::review_package,
        handlers::packages::delete_package,
        handlers::packages::vendor_packages,
        handlers::packages::review_queue,
        handlers::bookings::create_booking,
        handlers::bookings::list_bookings,
        handlers::bookings::get_booking,
        handlers::bookings::transition_booking,
        handlers::bookings::update_payment,
        handlers::dashboard::stats,
        handlers::users::list_users,
        handlers::users::update_user,
    ),
    components(
        schemas(
            dtos::Pagination,
            dtos::MessageResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::VendorProfileInput,
            dtos::auth::LoginRequest,
            dtos::auth::AuthResponse,
            dtos::users::VendorProfileResponse,
            dtos::users::UserResponse,
            dtos::users::UserListResponse,
            dtos::users::UpdateUserRequest,
            dtos::packages::CreatePackageRequest,
            dtos::packages::UpdatePackageRequest,
            dtos::packages::ApprovalDecision,
            dtos::packages::ApprovalRequest,
            dtos::packages::PackageResponse,
            dtos::packages::PackageListResponse,
            dtos::packages::FeaturedPackagesResponse,
            dtos::bookings::CreateBookingRequest,
            dtos::bookings::PaymentStatusRequest,
            dtos::bookings::BookingResponse,
            dtos::bookings::BookingListResponse,
            dtos::dashboard::RoleCounts,
            dtos::dashboard::PackageStatusCounts,
            dtos::dashboard::BookingStatusCounts,
            dtos::dashboard::AdminStats,
            dtos::dashboard::VendorStats,
            dtos::dashboard::UserStats,
            dtos::dashboard::DashboardStatsResponse,
            models::Role,
            models::PackageStatus,
            models::ItineraryDay,
            models::BookingStatus,
            models::PaymentStatus,
            models::BookingAction,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and the current user"),
        (name = "Packages", description = "Tour package catalog and vendor listings"),
        (name = "Bookings", description = "Booking lifecycle and payment status"),
        (name = "Dashboard", description = "Role-scoped statistics"),
        (name = "Admin", description = "User management and package review"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: TourConfig,
    pub store: Arc<dyn TourStore>,
    pub jwt: JwtService,
    pub auth_service: AuthService,
    pub packages: PackageRepository,
    pub bookings: BookingRepository,
    pub dashboard: DashboardService,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(config: TourConfig, store: Arc<dyn TourStore>) -> Self {
        let jwt = JwtService::new(&config.jwt);
        let limits = &config.rate_limit;
        let login_rate_limiter =
            create_ip_rate_limiter(limits.login_attempts, limits.login_window_seconds);
        let register_rate_limiter =
            create_ip_rate_limiter(limits.register_attempts, limits.register_window_seconds);

        Self {
            auth_service: AuthService::new(store.clone(), jwt.clone()),
            packages: PackageRepository::new(store.clone()),
            bookings: BookingRepository::new(store.clone()),
            dashboard: DashboardService::new(store.clone()),
            jwt,
            store,
            login_rate_limiter,
            register_rate_limiter,
            config,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let login_route = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let register_route = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let authenticated_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/bookings",
            get(handlers::bookings::list_bookings).post(handlers::bookings::create_booking),
        )
        .route("/bookings/:id", get(handlers::bookings::get_booking))
        .route("/bookings/:id/payment", put(handlers::bookings::update_payment))
        .route(
            "/bookings/:id/:action",
            put(handlers::bookings::transition_booking),
        )
        .route("/dashboard/stats", get(handlers::dashboard::stats))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    // Layers run bottom-up: auth first, then the role gate.
    let vendor_routes = Router::new()
        .route("/packages", post(handlers::packages::create_package))
        .route(
            "/packages/:id",
            put(handlers::packages::update_package).delete(handlers::packages::delete_package),
        )
        .route("/vendor/packages", get(handlers::packages::vendor_packages))
        .layer(from_fn_with_state(
            RoleGate(policy::VENDOR_OR_ADMIN),
            require_roles,
        ))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route(
            "/packages/:id/approval",
            put(handlers::packages::review_package),
        )
        .route("/admin/packages", get(handlers::packages::review_queue))
        .route("/admin/users", get(handlers::users::list_users))
        .route("/admin/users/:id", put(handlers::users::update_user))
        .layer(from_fn_with_state(RoleGate(policy::ADMIN_ONLY), require_roles))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .route(
            "/.well-known/openapi.json",
            get(handlers::health::openapi_document),
        )
        .route("/packages", get(handlers::packages::list_packages))
        .route(
            "/packages/featured",
            get(handlers::packages::featured_packages),
        )
        .route("/packages/:id", get(handlers::packages::get_package))
        .merge(login_route)
        .merge(register_route)
        .merge(authenticated_routes)
        .merge(vendor_routes)
        .merge(admin_routes)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}
