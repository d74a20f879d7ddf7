use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{AuthResponse, LoginRequest, RegisterRequest},
    dtos::users::UserResponse,
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// Register a traveller or vendor account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields, or email already registered"),
        (status = 429, description = "Too many attempts")
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.auth_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account is disabled"),
        (status = 429, description = "Too many attempts")
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    Ok(Json(state.auth_service.login(req).await?))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(state.auth_service.me(&identity).await?))
}
