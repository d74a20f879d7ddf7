use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::page_window,
    dtos::users::{UpdateUserRequest, UserListParams, UserListResponse, UserResponse},
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

#[utoipa::path(
    get,
    path = "/admin/users",
    params(UserListParams),
    responses(
        (status = 200, description = "Users, newest first", body = UserListResponse),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(params): Query<UserListParams>,
) -> Result<Json<UserListResponse>, AppError> {
    let (page, limit) = page_window(params.page, params.limit);
    let res = state
        .auth_service
        .list_users(&identity, params.role, page, limit)
        .await?;
    Ok(Json(res))
}

/// Change a user's role or active flag
#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Admins cannot demote or disable themselves")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let res = state.auth_service.update_user(&identity, &id, req).await?;
    Ok(Json(res))
}
