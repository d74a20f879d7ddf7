use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::{AppError, FieldViolation};

use crate::{
    dtos::packages::{
        ApprovalRequest, CreatePackageRequest, FeaturedPackagesResponse, FeaturedParams,
        PackageListParams, PackageListResponse, PackageResponse, PageParams, ReviewQueueParams,
        UpdatePackageRequest,
    },
    dtos::{page_window, MessageResponse, Pagination, MAX_PAGE_SIZE},
    middleware::AuthUser,
    models::{PackageStatus, TourPackage},
    services::store::{PackageSort, SortField, SortOrder},
    services::PackageQuery,
    utils::ValidatedJson,
    AppState,
};

const DEFAULT_FEATURED: i64 = 6;

/// Browse approved, available packages
#[utoipa::path(
    get,
    path = "/packages",
    params(PackageListParams),
    responses(
        (status = 200, description = "Matching packages", body = PackageListResponse),
        (status = 400, description = "Invalid sort parameters")
    ),
    tag = "Packages"
)]
pub async fn list_packages(
    State(state): State<AppState>,
    Query(params): Query<PackageListParams>,
) -> Result<Json<PackageListResponse>, AppError> {
    let sort = parse_sort(params.sort_by.as_deref(), params.sort_order.as_deref())?;
    let (page, limit) = page_window(params.page, params.limit);

    let (packages, total) = state
        .packages
        .list(PackageQuery {
            destination: params.destination,
            min_price: params.min_price,
            max_price: params.max_price,
            search: params.search,
            featured: params.featured,
            sort,
            page,
            limit,
        })
        .await?;

    Ok(Json(listing(packages, page, limit, total)))
}

#[utoipa::path(
    get,
    path = "/packages/featured",
    params(FeaturedParams),
    responses((status = 200, description = "Featured packages, newest first", body = FeaturedPackagesResponse)),
    tag = "Packages"
)]
pub async fn featured_packages(
    State(state): State<AppState>,
    Query(params): Query<FeaturedParams>,
) -> Result<Json<FeaturedPackagesResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_FEATURED).clamp(1, MAX_PAGE_SIZE);
    let packages = state.packages.list_featured(limit).await?;
    Ok(Json(FeaturedPackagesResponse {
        packages: packages.into_iter().map(PackageResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/packages/{id}",
    params(("id" = String, Path, description = "Package id")),
    responses(
        (status = 200, description = "Package", body = PackageResponse),
        (status = 404, description = "Package not found")
    ),
    tag = "Packages"
)]
pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PackageResponse>, AppError> {
    Ok(Json(state.packages.get_by_id(&id).await?.into()))
}

/// Create a package. Vendor packages start pending; admin packages are approved.
#[utoipa::path(
    post,
    path = "/packages",
    request_body = CreatePackageRequest,
    responses(
        (status = 201, description = "Package created", body = PackageResponse),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Vendor or admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Packages"
)]
pub async fn create_package(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ValidatedJson(req): ValidatedJson<CreatePackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let package = state.packages.create(&identity, req.into()).await?;
    Ok((StatusCode::CREATED, Json(PackageResponse::from(package))))
}

#[utoipa::path(
    put,
    path = "/packages/{id}",
    params(("id" = String, Path, description = "Package id")),
    request_body = UpdatePackageRequest,
    responses(
        (status = 200, description = "Package updated", body = PackageResponse),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Package not found"),
        (status = 409, description = "Package not approved or modified concurrently")
    ),
    security(("bearer_auth" = [])),
    tag = "Packages"
)]
pub async fn update_package(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdatePackageRequest>,
) -> Result<Json<PackageResponse>, AppError> {
    let package = state.packages.update(&id, &identity, req.into()).await?;
    Ok(Json(package.into()))
}

#[utoipa::path(
    put,
    path = "/packages/{id}/approval",
    params(("id" = String, Path, description = "Package id")),
    request_body = ApprovalRequest,
    responses(
        (status = 200, description = "Package reviewed", body = PackageResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Package not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Packages"
)]
pub async fn review_package(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ApprovalRequest>,
) -> Result<Json<PackageResponse>, AppError> {
    let decision = req.decision.ok_or_else(|| {
        AppError::ValidationError(vec![FieldViolation::new("decision", "Decision is required")])
    })?;
    let package = state
        .packages
        .set_approval(&id, &identity, decision)
        .await?;
    Ok(Json(package.into()))
}

#[utoipa::path(
    delete,
    path = "/packages/{id}",
    params(("id" = String, Path, description = "Package id")),
    responses(
        (status = 200, description = "Package deleted", body = MessageResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Package not found"),
        (status = 409, description = "Package has bookings")
    ),
    security(("bearer_auth" = [])),
    tag = "Packages"
)]
pub async fn delete_package(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.packages.delete(&id, &identity).await?;
    Ok(Json(MessageResponse {
        message: "Package deleted".to_string(),
    }))
}

/// The caller's own packages, any status
#[utoipa::path(
    get,
    path = "/vendor/packages",
    params(PageParams),
    responses(
        (status = 200, description = "Own packages", body = PackageListResponse),
        (status = 403, description = "Vendor or admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Packages"
)]
pub async fn vendor_packages(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(params): Query<PageParams>,
) -> Result<Json<PackageListResponse>, AppError> {
    let (page, limit) = page_window(params.page, params.limit);
    let (packages, total) = state
        .packages
        .list_by_vendor(&identity, &identity.id, page, limit)
        .await?;
    Ok(Json(listing(packages, page, limit, total)))
}

/// Admin review queue, oldest first
#[utoipa::path(
    get,
    path = "/admin/packages",
    params(ReviewQueueParams),
    responses(
        (status = 200, description = "Packages in the requested status", body = PackageListResponse),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn review_queue(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(params): Query<ReviewQueueParams>,
) -> Result<Json<PackageListResponse>, AppError> {
    let (page, limit) = page_window(params.page, params.limit);
    let status = params.status.unwrap_or(PackageStatus::Pending);
    let (packages, total) = state
        .packages
        .list_by_status(&identity, status, page, limit)
        .await?;
    Ok(Json(listing(packages, page, limit, total)))
}

fn listing(packages: Vec<TourPackage>, page: u64, limit: i64, total: u64) -> PackageListResponse {
    PackageListResponse {
        packages: packages.into_iter().map(PackageResponse::from).collect(),
        pagination: Pagination::new(page, limit, total),
    }
}

fn parse_sort(sort_by: Option<&str>, sort_order: Option<&str>) -> Result<PackageSort, AppError> {
    let mut violations = Vec::new();

    let field = match sort_by {
        None | Some("createdAt") => SortField::CreatedAt,
        Some("price") => SortField::Price,
        Some("title") => SortField::Title,
        Some("views") => SortField::Views,
        Some("duration") => SortField::Duration,
        Some(_) => {
            violations.push(FieldViolation::new(
                "sortBy",
                "sortBy must be one of createdAt, price, title, views, duration",
            ));
            SortField::CreatedAt
        }
    };

    let order = match sort_order.map(str::to_lowercase).as_deref() {
        None | Some("desc") => SortOrder::Desc,
        Some("asc") => SortOrder::Asc,
        Some(_) => {
            violations.push(FieldViolation::new("sortOrder", "sortOrder must be asc or desc"));
            SortOrder::Desc
        }
    };

    if violations.is_empty() {
        Ok(PackageSort { field, order })
    } else {
        Err(AppError::ValidationError(violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_defaults_to_newest_first() {
        assert_eq!(parse_sort(None, None).unwrap(), PackageSort::default());
        assert_eq!(
            parse_sort(Some("price"), Some("ASC")).unwrap(),
            PackageSort {
                field: SortField::Price,
                order: SortOrder::Asc
            }
        );
    }

    #[test]
    fn bad_sort_reports_both_fields() {
        match parse_sort(Some("rating"), Some("sideways")) {
            Err(AppError::ValidationError(fields)) => assert_eq!(fields.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
