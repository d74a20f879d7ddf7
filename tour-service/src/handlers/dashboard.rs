use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{dtos::dashboard::DashboardStatsResponse, middleware::AuthUser, AppState};

/// Aggregates for the caller's role
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    responses(
        (status = 200, description = "Role-scoped counts and revenue", body = DashboardStatsResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn stats(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<DashboardStatsResponse>, AppError> {
    Ok(Json(state.dashboard.stats(&identity).await?))
}
